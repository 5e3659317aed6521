use std::mem::offset_of;

use web_sys::{
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlTexture, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

use super::gl::{self, AttrKind, InstanceAttr, MatrixUniforms};
use crate::camera::Matrices;
use crate::error::{Result, VizError};
use crate::nodes::{node_fragment_shader, node_vertex_shader, NodeInstance, QUAD_CORNERS};

const ATTRS: [InstanceAttr; 5] = [
    InstanceAttr {
        name: "a_xyz",
        size: 3,
        kind: AttrKind::Float,
        offset: offset_of!(NodeInstance, xyz),
    },
    InstanceAttr {
        name: "a_radius",
        size: 1,
        kind: AttrKind::Float,
        offset: offset_of!(NodeInstance, radius),
    },
    InstanceAttr {
        name: "a_color",
        size: 3,
        kind: AttrKind::Float,
        offset: offset_of!(NodeInstance, color),
    },
    InstanceAttr {
        name: "a_icons",
        size: 2,
        kind: AttrKind::UnsignedShort,
        offset: offset_of!(NodeInstance, icons),
    },
    InstanceAttr {
        name: "a_decorators",
        size: 4,
        kind: AttrKind::UnsignedShort,
        offset: offset_of!(NodeInstance, decorators),
    },
];

/// Draws every node as an instanced, camera-facing sprite.
pub struct NodeRenderer {
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    _buffer: WebGlBuffer,
    count: i32,
    matrices: MatrixUniforms,
    atlas: WebGlUniformLocation,
}

impl NodeRenderer {
    pub fn new(gl: &GL, instances: &[NodeInstance]) -> Result<Self> {
        let program = gl::link_program(gl, &node_vertex_shader(), &node_fragment_shader())?;
        let matrices = MatrixUniforms::locate(gl, &program)?;
        let atlas = gl::uniform(gl, &program, "u_atlas")?;

        let vao = gl
            .create_vertex_array()
            .ok_or(VizError::ResourceCreation("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));
        let buffer = gl::upload_instances(gl, instances, GL::STATIC_DRAW)?;
        gl::bind_instance_attributes::<NodeInstance>(gl, &program, &ATTRS)?;
        gl.bind_vertex_array(None);

        Ok(Self {
            program,
            vao,
            _buffer: buffer,
            count: instances.len() as i32,
            matrices,
            atlas,
        })
    }

    pub fn draw(&self, gl: &GL, m: &Matrices, atlas: &WebGlTexture) {
        if self.count == 0 {
            return;
        }
        gl.use_program(Some(&self.program));
        self.matrices.set(gl, m);

        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(atlas));
        gl.uniform1i(Some(&self.atlas), 0);

        gl.bind_vertex_array(Some(&self.vao));
        gl.draw_arrays_instanced(GL::TRIANGLES, 0, QUAD_CORNERS.len() as i32, self.count);
        gl.bind_vertex_array(None);
    }
}
