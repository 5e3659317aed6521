//! Thin helpers over the WebGL2 context: programs, instance buffers and the
//! icon atlas texture.

use bytemuck::Pod;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    HtmlImageElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation,
};

use crate::camera::Matrices;
use crate::error::{Result, VizError};

pub fn compile_shader(gl: &GL, stage: u32, source: &str) -> Result<WebGlShader> {
    let shader = gl
        .create_shader(stage)
        .ok_or(VizError::ResourceCreation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        return Ok(shader);
    }

    let log = gl.get_shader_info_log(&shader).unwrap_or_default();
    gl.delete_shader(Some(&shader));
    Err(VizError::ShaderCompile {
        stage: if stage == GL::VERTEX_SHADER { "vertex" } else { "fragment" },
        log,
    })
}

pub fn link_program(gl: &GL, vs_source: &str, fs_source: &str) -> Result<WebGlProgram> {
    let vs = compile_shader(gl, GL::VERTEX_SHADER, vs_source)?;
    let fs = compile_shader(gl, GL::FRAGMENT_SHADER, fs_source)?;
    let program = gl
        .create_program()
        .ok_or(VizError::ResourceCreation("program"))?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);

    // The program keeps what it needs once linked.
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));

    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(VizError::ProgramLink(log))
    }
}

pub fn uniform(gl: &GL, program: &WebGlProgram, name: &str) -> Result<WebGlUniformLocation> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| VizError::MissingUniform(name.to_string()))
}

/// The transform uniforms every program here declares.
pub struct MatrixUniforms {
    model: WebGlUniformLocation,
    view: WebGlUniformLocation,
    projection: WebGlUniformLocation,
}

impl MatrixUniforms {
    pub fn locate(gl: &GL, program: &WebGlProgram) -> Result<Self> {
        Ok(Self {
            model: uniform(gl, program, "u_model")?,
            view: uniform(gl, program, "u_view")?,
            projection: uniform(gl, program, "u_projection")?,
        })
    }

    pub fn set(&self, gl: &GL, m: &Matrices) {
        gl.uniform_matrix4fv_with_f32_array(Some(&self.model), false, &m.model.to_cols_array());
        gl.uniform_matrix4fv_with_f32_array(Some(&self.view), false, &m.view.to_cols_array());
        gl.uniform_matrix4fv_with_f32_array(
            Some(&self.projection),
            false,
            &m.projection.to_cols_array(),
        );
    }
}

/// How the shader reads an instance attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttrKind {
    Float,
    UnsignedShort,
    UnsignedInt,
}

/// One field of an instance struct, as seen by the vertex shader.
#[derive(Debug, Clone, Copy)]
pub struct InstanceAttr {
    pub name: &'static str,
    pub size: i32,
    pub kind: AttrKind,
    pub offset: usize,
}

/// Upload `data` into a new array buffer with the given `usage` hint.
pub fn upload_instances<T: Pod>(gl: &GL, data: &[T], usage: u32) -> Result<WebGlBuffer> {
    let buffer = gl
        .create_buffer()
        .ok_or(VizError::ResourceCreation("buffer"))?;
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
    gl.buffer_data_with_u8_array(GL::ARRAY_BUFFER, bytemuck::cast_slice(data), usage);
    Ok(buffer)
}

/// Point the program's instance attributes at the bound array buffer, one
/// `T` per instance.
pub fn bind_instance_attributes<T>(
    gl: &GL,
    program: &WebGlProgram,
    attrs: &[InstanceAttr],
) -> Result<()> {
    let stride = std::mem::size_of::<T>() as i32;
    for attr in attrs {
        let location = gl.get_attrib_location(program, attr.name);
        let location =
            u32::try_from(location).map_err(|_| VizError::MissingAttribute(attr.name.to_string()))?;
        gl.enable_vertex_attrib_array(location);
        let offset = attr.offset as i32;
        match attr.kind {
            AttrKind::Float => {
                gl.vertex_attrib_pointer_with_i32(location, attr.size, GL::FLOAT, false, stride, offset)
            }
            AttrKind::UnsignedShort => gl.vertex_attrib_i_pointer_with_i32(
                location,
                attr.size,
                GL::UNSIGNED_SHORT,
                stride,
                offset,
            ),
            AttrKind::UnsignedInt => gl.vertex_attrib_i_pointer_with_i32(
                location,
                attr.size,
                GL::UNSIGNED_INT,
                stride,
                offset,
            ),
        }
        gl.vertex_attrib_divisor(location, 1);
    }
    Ok(())
}

/// Create the atlas texture and start loading `url` into it.
///
/// Until the image arrives the texture is a single opaque blue pixel, so
/// drawing can start straight away. `on_load` runs once the real image is in
/// place.
pub fn load_atlas(gl: &GL, url: &str, on_load: impl Fn() + 'static) -> std::result::Result<WebGlTexture, JsValue> {
    let texture = gl
        .create_texture()
        .ok_or(VizError::ResourceCreation("texture"))?;
    gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
    gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
        GL::TEXTURE_2D,
        0,
        GL::RGBA as i32,
        1,
        1,
        0,
        GL::RGBA,
        GL::UNSIGNED_BYTE,
        Some(&[0, 0, 255, 255]),
    )?;
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::NEAREST as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::NEAREST as i32);

    let image = HtmlImageElement::new()?;

    let onload = {
        let gl = gl.clone();
        let texture = texture.clone();
        let image = image.clone();
        Closure::wrap(Box::new(move || {
            gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
            if let Err(err) = gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
                GL::TEXTURE_2D,
                0,
                GL::RGBA as i32,
                GL::RGBA,
                GL::UNSIGNED_BYTE,
                &image,
            ) {
                log::error!("atlas upload failed: {err:?}");
                return;
            }
            gl.generate_mipmap(GL::TEXTURE_2D);
            gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
            gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
            gl.tex_parameteri(
                GL::TEXTURE_2D,
                GL::TEXTURE_MIN_FILTER,
                GL::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
            log::info!(
                "atlas loaded: {}x{}",
                image.natural_width(),
                image.natural_height()
            );
            on_load();
        }) as Box<dyn FnMut()>)
    };
    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    let onerror = {
        let url = url.to_string();
        Closure::wrap(Box::new(move || {
            log::warn!("could not load atlas {url}; icons stay blank");
        }) as Box<dyn FnMut()>)
    };
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    image.set_src(url);
    Ok(texture)
}
