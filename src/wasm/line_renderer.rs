use std::mem::offset_of;

use web_sys::{WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlVertexArrayObject};

use super::gl::{self, AttrKind, InstanceAttr, MatrixUniforms};
use crate::camera::Matrices;
use crate::error::{Result, VizError};
use crate::transactions::{
    line_fragment_shader, line_vertex_shader, sort_back_to_front, LineInstance,
    VERTICES_PER_LINE,
};

const ATTRS: [InstanceAttr; 8] = [
    InstanceAttr {
        name: "a_from",
        size: 3,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, from),
    },
    InstanceAttr {
        name: "a_from_radius",
        size: 1,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, from_radius),
    },
    InstanceAttr {
        name: "a_to",
        size: 3,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, to),
    },
    InstanceAttr {
        name: "a_to_radius",
        size: 1,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, to_radius),
    },
    InstanceAttr {
        name: "a_color",
        size: 3,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, color),
    },
    InstanceAttr {
        name: "a_width",
        size: 1,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, width),
    },
    InstanceAttr {
        name: "a_offset",
        size: 1,
        kind: AttrKind::Float,
        offset: offset_of!(LineInstance, offset),
    },
    InstanceAttr {
        name: "a_flags",
        size: 1,
        kind: AttrKind::UnsignedInt,
        offset: offset_of!(LineInstance, flags),
    },
];

/// Draws transactions as translucent lines, furthest first.
pub struct LineRenderer {
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    buffer: WebGlBuffer,
    lines: Vec<LineInstance>,
    matrices: MatrixUniforms,
}

impl LineRenderer {
    pub fn new(gl: &GL, lines: Vec<LineInstance>) -> Result<Self> {
        let program = gl::link_program(gl, &line_vertex_shader(), &line_fragment_shader())?;
        let matrices = MatrixUniforms::locate(gl, &program)?;

        let vao = gl
            .create_vertex_array()
            .ok_or(VizError::ResourceCreation("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));
        let buffer = gl::upload_instances(gl, &lines, GL::DYNAMIC_DRAW)?;
        gl::bind_instance_attributes::<LineInstance>(gl, &program, &ATTRS)?;
        gl.bind_vertex_array(None);

        Ok(Self {
            program,
            vao,
            buffer,
            lines,
            matrices,
        })
    }

    pub fn draw(&mut self, gl: &GL, m: &Matrices) {
        if self.lines.is_empty() {
            return;
        }

        // Blending needs back-to-front order, which changes as the model turns.
        sort_back_to_front(&mut self.lines, m.eye_in_model_space());
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&self.buffer));
        gl.buffer_sub_data_with_i32_and_u8_array(
            GL::ARRAY_BUFFER,
            0,
            bytemuck::cast_slice(&self.lines),
        );

        gl.use_program(Some(&self.program));
        self.matrices.set(gl, m);

        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
        gl.depth_mask(false);

        gl.bind_vertex_array(Some(&self.vao));
        gl.draw_arrays_instanced(
            GL::TRIANGLES,
            0,
            VERTICES_PER_LINE as i32,
            self.lines.len() as i32,
        );
        gl.bind_vertex_array(None);

        gl.depth_mask(true);
        gl.disable(GL::BLEND);
    }
}
