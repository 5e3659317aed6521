use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlTexture};

use super::gl;
use super::input;
use super::line_renderer::LineRenderer;
use super::node_renderer::NodeRenderer;
use crate::camera::{Camera, Matrices, Orbit};
use crate::config::VizConfig;
use crate::error::VizError;
use crate::layout::{coords_radius, Graph};
use crate::nodes::pack_nodes;
use crate::transactions::pack_transactions;

/// Everything a frame needs: GL objects, the camera and the drag state.
pub struct Renderer {
    gl: GL,
    canvas: HtmlCanvasElement,
    nodes: NodeRenderer,
    lines: LineRenderer,
    atlas: Option<WebGlTexture>,
    pub camera: Camera,
    pub orbit: Orbit,
    spin: bool,
    distance: f32,
    clear_color: [f32; 4],
}

impl Renderer {
    fn new(canvas: HtmlCanvasElement, config: &VizConfig, graph: &Graph) -> Result<Self, JsValue> {
        // No alpha in the backbuffer, so the page never shows through.
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"alpha".into(), &JsValue::FALSE)?;
        let gl: GL = canvas
            .get_context_with_context_options("webgl2", &options)?
            .ok_or(VizError::WebGl2Unavailable)?
            .dyn_into()?;

        let nodes = NodeRenderer::new(&gl, &pack_nodes(&graph.nodes))?;
        let lines = LineRenderer::new(&gl, pack_transactions(graph))?;

        let aspect = aspect_of(&canvas);
        let scene_radius = coords_radius(&graph.nodes);
        let camera = Camera::framing(aspect, scene_radius);
        let distance = camera.eye.length();
        log::info!("scene radius: {scene_radius:.2}, camera distance: {distance:.2}");

        Ok(Self {
            gl,
            canvas,
            nodes,
            lines,
            atlas: None,
            camera,
            orbit: Orbit::default(),
            spin: config.spin,
            distance,
            clear_color: config.clear_color,
        })
    }

    /// Draw one frame. Returns true when another frame should follow.
    fn draw(&mut self, time_ms: f64) -> bool {
        log::trace!("draw at {time_ms:.1}ms");
        self.resize_to_display_size();

        let gl = &self.gl;
        gl.viewport(0, 0, self.canvas.width() as i32, self.canvas.height() as i32);
        gl.enable(GL::DEPTH_TEST);
        let [r, g, b, a] = self.clear_color;
        gl.clear_color(r, g, b, a);
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);

        if self.spin {
            self.camera.spin((time_ms * 0.001) as f32, self.distance);
        }

        let m = Matrices::new(&self.camera, &self.orbit, aspect_of(&self.canvas));
        if let Some(atlas) = &self.atlas {
            self.nodes.draw(gl, &m, atlas);
        }
        self.lines.draw(gl, &m);

        self.spin
    }

    fn resize_to_display_size(&self) {
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
    }
}

fn aspect_of(canvas: &HtmlCanvasElement) -> f32 {
    let w = canvas.client_width().max(1) as f32;
    let h = canvas.client_height().max(1) as f32;
    w / h
}

/// Schedules frames on demand: any number of requests before the next
/// animation frame result in a single draw.
#[derive(Clone)]
pub struct Redraw {
    inner: Rc<RedrawInner>,
}

struct RedrawInner {
    pending: Cell<bool>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl Redraw {
    fn new(renderer: Rc<RefCell<Renderer>>) -> Self {
        let inner = Rc::new(RedrawInner {
            pending: Cell::new(false),
            frame: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let frame = Closure::wrap(Box::new(move |time: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(false);
            if renderer.borrow_mut().draw(time) {
                Redraw { inner }.request();
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.frame.borrow_mut() = Some(frame);

        Self { inner }
    }

    pub fn request(&self) {
        if self.inner.pending.replace(true) {
            return;
        }
        let Some(window) = window() else {
            self.inner.pending.set(false);
            return;
        };
        let frame = self.inner.frame.borrow();
        let Some(frame) = frame.as_ref() else {
            self.inner.pending.set(false);
            return;
        };
        if let Err(err) = window.request_animation_frame(frame.as_ref().unchecked_ref()) {
            log::error!("request_animation_frame failed: {err:?}");
            self.inner.pending.set(false);
        }
    }
}

/// Build the GL state for `graph`, wire up input and draw the first frame.
pub fn start(canvas: HtmlCanvasElement, config: &VizConfig, graph: &Graph) -> Result<(), JsValue> {
    let renderer = Rc::new(RefCell::new(Renderer::new(canvas.clone(), config, graph)?));
    let redraw = Redraw::new(renderer.clone());

    let atlas = {
        let redraw = redraw.clone();
        let gl = renderer.borrow().gl.clone();
        gl::load_atlas(&gl, &config.atlas_url, move || redraw.request())?
    };
    renderer.borrow_mut().atlas = Some(atlas);

    // The canvas is resized to its client size at the start of each draw.
    let resize_closure = {
        let redraw = redraw.clone();
        Closure::wrap(Box::new(move || redraw.request()) as Box<dyn FnMut()>)
    };
    window()
        .ok_or(VizError::MissingElement("window".into()))?
        .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;
    resize_closure.forget();

    input::attach(&canvas, renderer, redraw.clone())?;

    redraw.request();
    Ok(())
}
