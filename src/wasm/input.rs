//! Mouse drag rotates the model, the wheel zooms towards the cursor.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, convert::FromWasmAbi, JsCast, JsValue};
use web_sys::{AddEventListenerOptions, EventTarget, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render::{Redraw, Renderer};
use crate::camera::zoom_point_direction;

fn listen<E>(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    // Not passive, so handlers may call prevent_default.
    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        closure.as_ref().unchecked_ref(),
        &options,
    )?;
    closure.forget();
    Ok(())
}

pub fn attach(
    canvas: &HtmlCanvasElement,
    renderer: Rc<RefCell<Renderer>>,
    redraw: Redraw,
) -> Result<(), JsValue> {
    let target: &EventTarget = canvas.as_ref();

    {
        let renderer = renderer.clone();
        listen(target, "mousedown", move |e: MouseEvent| {
            e.prevent_default();
            renderer
                .borrow_mut()
                .orbit
                .press(e.offset_x() as f32, e.offset_y() as f32);
        })?;
    }

    for kind in ["mouseup", "mouseleave"] {
        let renderer = renderer.clone();
        listen(target, kind, move |_: MouseEvent| {
            renderer.borrow_mut().orbit.release();
        })?;
    }

    {
        let renderer = renderer.clone();
        let redraw = redraw.clone();
        listen(target, "mousemove", move |e: MouseEvent| {
            e.prevent_default();
            let moved = renderer
                .borrow_mut()
                .orbit
                .drag(e.offset_x() as f32, e.offset_y() as f32);
            if moved {
                redraw.request();
            }
        })?;
    }

    {
        let canvas = canvas.clone();
        listen(target, "wheel", move |e: WheelEvent| {
            e.prevent_default();
            let direction = zoom_point_direction(
                canvas.width() as f32,
                canvas.height() as f32,
                e.client_x() as f32,
                e.client_y() as f32,
            );
            renderer
                .borrow_mut()
                .camera
                .zoom(direction, e.delta_y() as f32, e.ctrl_key());
            log::debug!("zoom to {:?}", renderer.borrow().camera.eye);
            redraw.request();
        })?;
    }

    Ok(())
}
