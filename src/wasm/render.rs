use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, HtmlCanvasElement, HtmlVideoElement, WebGl2RenderingContext as GL, WebGlFramebuffer,
    WebGlProgram, WebGlShader, WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

use super::webcam::Webcam;
use super::WebSession;
use crate::error::{Error, Result};
use crate::pipeline::{Renderer, Stage, StageKind};
use crate::scene;

const QUAD_VERT: &str = include_str!("../shaders/quad.vert");

// two triangles covering clip space
const QUAD: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, //
    -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
];

fn fragment_source(kind: StageKind) -> &'static str {
    match kind {
        StageKind::Scene => include_str!("../shaders/scene.frag"),
        StageKind::Film => include_str!("../shaders/film.frag"),
        StageKind::BadTv => include_str!("../shaders/bad_tv.frag"),
        StageKind::RgbShift => include_str!("../shaders/rgb_shift.frag"),
        StageKind::Static => include_str!("../shaders/static.frag"),
        StageKind::Copy => include_str!("../shaders/copy.frag"),
    }
}

fn js_err(e: JsValue) -> Error {
    Error::Render(format!("{e:?}"))
}

struct StageProgram {
    kind: StageKind,
    program: WebGlProgram,
    extent: Option<WebGlUniformLocation>,
    source: Option<WebGlUniformLocation>,
    uniforms: Vec<(&'static str, Option<WebGlUniformLocation>)>,
}

impl StageProgram {
    fn location(&self, name: &str) -> Option<&WebGlUniformLocation> {
        self.uniforms
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, loc)| loc.as_ref())
    }
}

/// Offscreen colour buffer for the ping-pong between stages.
struct Target {
    fbo: WebGlFramebuffer,
    texture: WebGlTexture,
}

/// Executes the stage chain with one fragment program per stage kind,
/// alternating between two offscreen targets until the presenting stage
/// draws to the canvas.
pub struct WebGlRenderer {
    gl: GL,
    canvas: HtmlCanvasElement,
    video: HtmlVideoElement,
    vao: WebGlVertexArrayObject,
    video_texture: WebGlTexture,
    programs: Vec<StageProgram>,
    targets: Vec<Target>,
    width: u32,
    height: u32,
    plane_extent: (f32, f32),
}

impl WebGlRenderer {
    pub fn new(canvas: &HtmlCanvasElement, video: HtmlVideoElement) -> Result<Self> {
        let gl: GL = canvas
            .get_context("webgl2")
            .map_err(js_err)?
            .ok_or_else(|| Error::Render("WebGL2 not supported".into()))?
            .dyn_into()
            .map_err(|_| Error::Render("context is not WebGL2".into()))?;

        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| Error::Render("cannot create vertex array".into()))?;
        gl.bind_vertex_array(Some(&vao));
        let buffer = gl
            .create_buffer()
            .ok_or_else(|| Error::Render("cannot create buffer".into()))?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        let verts = js_sys::Float32Array::from(&QUAD[..]);
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &verts, GL::STATIC_DRAW);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_with_i32(0, 2, GL::FLOAT, false, 0, 0);

        let programs = [
            StageKind::Scene,
            StageKind::Film,
            StageKind::BadTv,
            StageKind::RgbShift,
            StageKind::Static,
            StageKind::Copy,
        ]
        .into_iter()
        .map(|kind| build_program(&gl, kind))
        .collect::<Result<Vec<_>>>()?;

        // black until the camera delivers a frame
        let video_texture = create_texture(&gl)?;
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            1,
            1,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            Some(&[0u8, 0, 0, 255][..]),
        )
        .map_err(js_err)?;

        let width = canvas.width().max(1);
        let height = canvas.height().max(1);
        let mut renderer = Self {
            gl,
            canvas: canvas.clone(),
            video,
            vao,
            video_texture,
            programs,
            targets: Vec::new(),
            width,
            height,
            plane_extent: scene::plane_extent(scene::aspect(width, height)),
        };
        renderer.allocate_targets()?;
        Ok(renderer)
    }

    /// Build a fresh pair of targets at the current size. The old pair is
    /// only released once both new ones exist.
    fn allocate_targets(&mut self) -> Result<()> {
        let fresh = (0..2)
            .map(|_| create_target(&self.gl, self.width, self.height))
            .collect::<Result<Vec<_>>>();
        self.gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        let fresh = fresh?;
        for t in std::mem::replace(&mut self.targets, fresh) {
            self.gl.delete_framebuffer(Some(&t.fbo));
            self.gl.delete_texture(Some(&t.texture));
        }
        Ok(())
    }

    fn target(&self, i: usize) -> Result<&Target> {
        self.targets
            .get(i)
            .ok_or_else(|| Error::Render(format!("render target {i} missing")))
    }

    fn program(&self, kind: StageKind) -> Result<&StageProgram> {
        self.programs
            .iter()
            .find(|p| p.kind == kind)
            .ok_or(Error::StageNotFound(kind))
    }
}

impl Renderer for WebGlRenderer {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width.max(1);
        self.height = height.max(1);
        self.canvas.set_width(self.width);
        self.canvas.set_height(self.height);
        self.plane_extent = scene::plane_extent(scene::aspect(self.width, self.height));
        self.allocate_targets()
    }

    fn upload_frame(&mut self) -> Result<()> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.video_texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        let res = gl.tex_image_2d_with_u32_and_u32_and_html_video_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            &self.video,
        );
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        res.map_err(js_err)
    }

    fn render(&mut self, stages: &[Stage], _delta: f32) -> Result<()> {
        let gl = &self.gl;
        gl.bind_vertex_array(Some(&self.vao));

        let mut read: Option<usize> = None;
        let mut write = 0;
        for stage in stages {
            let prog = self.program(stage.kind())?;
            if stage.renders_to_screen() {
                gl.bind_framebuffer(GL::FRAMEBUFFER, None);
            } else {
                gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&self.target(write)?.fbo));
            }
            gl.viewport(0, 0, self.width as i32, self.height as i32);
            gl.use_program(Some(&prog.program));

            let input = match (stage.kind(), read) {
                (StageKind::Scene, _) | (_, None) => &self.video_texture,
                (_, Some(i)) => &self.target(i)?.texture,
            };
            gl.active_texture(GL::TEXTURE0);
            gl.bind_texture(GL::TEXTURE_2D, Some(input));
            gl.uniform1i(prog.source.as_ref(), 0);

            let (ex, ey) = if stage.kind() == StageKind::Scene {
                gl.clear_color(0.0, 0.0, 0.0, 1.0);
                gl.clear(GL::COLOR_BUFFER_BIT);
                self.plane_extent
            } else {
                (1.0, 1.0)
            };
            gl.uniform2f(prog.extent.as_ref(), ex, ey);

            for (name, value) in stage.uniforms() {
                if let Some(loc) = prog.location(name) {
                    gl.uniform1f(Some(loc), *value);
                }
            }

            gl.draw_arrays(GL::TRIANGLES, 0, 6);

            if !stage.renders_to_screen() {
                read = Some(write);
                write = 1 - write;
            }
        }
        Ok(())
    }
}

fn create_texture(gl: &GL) -> Result<WebGlTexture> {
    let texture = gl
        .create_texture()
        .ok_or_else(|| Error::Render("cannot create texture".into()))?;
    gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
    Ok(texture)
}

fn create_target(gl: &GL, width: u32, height: u32) -> Result<Target> {
    let texture = create_texture(gl)?;
    gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
        GL::TEXTURE_2D,
        0,
        GL::RGBA as i32,
        width as i32,
        height as i32,
        0,
        GL::RGBA,
        GL::UNSIGNED_BYTE,
        None,
    )
    .map_err(js_err)?;
    let fbo = gl
        .create_framebuffer()
        .ok_or_else(|| Error::Render("cannot create framebuffer".into()))?;
    gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&fbo));
    gl.framebuffer_texture_2d(
        GL::FRAMEBUFFER,
        GL::COLOR_ATTACHMENT0,
        GL::TEXTURE_2D,
        Some(&texture),
        0,
    );
    Ok(Target { fbo, texture })
}

fn compile_shader(gl: &GL, ty: u32, source: &str) -> Result<WebGlShader> {
    let shader = gl
        .create_shader(ty)
        .ok_or_else(|| Error::Render("cannot create shader".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(Error::Render(format!("shader compile: {log}")))
    }
}

fn build_program(gl: &GL, kind: StageKind) -> Result<StageProgram> {
    let vert = compile_shader(gl, GL::VERTEX_SHADER, QUAD_VERT)?;
    let frag = compile_shader(gl, GL::FRAGMENT_SHADER, fragment_source(kind))?;
    let program = gl
        .create_program()
        .ok_or_else(|| Error::Render("cannot create program".into()))?;
    gl.attach_shader(&program, &vert);
    gl.attach_shader(&program, &frag);
    gl.bind_attrib_location(&program, 0, "a_pos");
    gl.link_program(&program);
    gl.delete_shader(Some(&vert));
    gl.delete_shader(Some(&frag));

    if !gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        return Err(Error::Render(format!("{kind:?} program link: {log}")));
    }

    let uniforms = kind
        .default_uniforms()
        .iter()
        .map(|(name, _)| (*name, gl.get_uniform_location(&program, name)))
        .collect();
    Ok(StageProgram {
        kind,
        extent: gl.get_uniform_location(&program, "u_extent"),
        source: gl.get_uniform_location(&program, "t_diffuse"),
        uniforms,
        program,
    })
}

fn window_size() -> Option<(u32, u32)> {
    let w = window()?;
    let width = w.inner_width().ok()?.as_f64()?;
    let height = w.inner_height().ok()?.as_f64()?;
    Some((width as u32, height as u32))
}

/// Hook up resize handling and start the animation loop.
pub fn start(session: Rc<RefCell<WebSession>>, webcam: Webcam) -> std::result::Result<(), JsValue> {
    let window = window().ok_or("no window")?;

    // Resize canvas to fit window
    let resize_closure = {
        let session = session.clone();
        Closure::wrap(Box::new(move || {
            if let Some((w, h)) = window_size() {
                if let Err(e) = session.borrow_mut().resize(w, h) {
                    log::error!("resize failed: {e}");
                }
            }
        }) as Box<dyn FnMut()>)
    };
    window.add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;
    resize_closure.forget();

    if let Some((w, h)) = window_size() {
        session.borrow_mut().resize(w, h)?;
    }
    session.borrow_mut().start();

    // `f` holds the animation-frame closure so that it can keep calling
    // `request_animation_frame` on itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        if let Err(e) = session.borrow_mut().tick(now, webcam.frame_status()) {
            log::error!("frame failed: {e}");
        }

        // schedule next
        if let (Some(w), Some(cb)) = (web_sys::window(), f.borrow().as_ref()) {
            if let Err(e) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame: {e:?}");
            }
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(cb) = g.borrow().as_ref() {
        window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn renderer() -> WebGlRenderer {
        let document = web_sys::window().unwrap().document().unwrap();
        let canvas = document
            .create_element("canvas")
            .unwrap()
            .dyn_into::<HtmlCanvasElement>()
            .unwrap();
        let video = document
            .create_element("video")
            .unwrap()
            .dyn_into::<HtmlVideoElement>()
            .unwrap();
        WebGlRenderer::new(&canvas, video).unwrap()
    }

    fn chain() -> Vec<Stage> {
        vec![
            Stage::new(StageKind::Scene),
            Stage::new(StageKind::Film),
            Stage::present(),
        ]
    }

    #[wasm_bindgen_test]
    fn resize_keeps_a_full_target_pair() {
        let mut r = renderer();
        r.resize(64, 32).unwrap();
        assert_eq!(r.targets.len(), 2);
        assert_eq!(r.canvas.width(), 64);
        r.render(&chain(), 0.1).unwrap();
    }

    #[wasm_bindgen_test]
    fn missing_targets_are_an_error_not_a_panic() {
        let mut r = renderer();
        r.targets.clear();
        assert!(matches!(r.render(&chain(), 0.1), Err(Error::Render(_))));
    }
}
