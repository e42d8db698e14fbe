//! Per-glyph draw procedures and their execution into positioned quads.

use crate::backend::{ProgramId, TextureId};
use crate::error::{FontError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    BindTexture(TextureId),
    /// Move the current origin; persists past the end of the program.
    Translate([f32; 2]),
    PushTransform,
    PopTransform,
    /// Draw the bound texture as a `size` quad at the current origin,
    /// sampling texture coordinates `[0, uv.0] x [0, uv.1]`.
    DrawQuad { size: [f32; 2], uv: [f32; 2] },
}

/// Recorded draw procedure for one glyph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphProgram {
    pub commands: Vec<Command>,
}

impl GlyphProgram {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    pub fn push(&mut self, cmd: Command) -> &mut Self {
        self.commands.push(cmd);
        self
    }

    /// Textures this program binds.
    pub fn textures(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            Command::BindTexture(t) => Some(*t),
            _ => None,
        })
    }
}

/// Screen-space quad produced by executing programs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphQuad {
    pub texture: TextureId,
    pub rect: Rect,
    /// Max texture coordinates; the quad samples `[0, uv[0]] x [0, uv[1]]`.
    pub uv: [f32; 2],
}

/// Executes programs with a translation stack and a bound texture.
pub struct QuadBuilder {
    origin: [f32; 2],
    stack: Vec<[f32; 2]>,
    bound: Option<TextureId>,
    quads: Vec<GlyphQuad>,
}

impl QuadBuilder {
    pub fn new(origin: [f32; 2]) -> Self {
        Self { origin, stack: Vec::new(), bound: None, quads: Vec::new() }
    }

    /// Current pen position.
    pub fn pen(&self) -> [f32; 2] {
        self.origin
    }

    pub fn execute(&mut self, program: &GlyphProgram) -> Result<()> {
        for cmd in &program.commands {
            match *cmd {
                Command::BindTexture(t) => self.bound = Some(t),
                Command::Translate([dx, dy]) => {
                    self.origin[0] += dx;
                    self.origin[1] += dy;
                }
                Command::PushTransform => self.stack.push(self.origin),
                Command::PopTransform => {
                    self.origin = self
                        .stack
                        .pop()
                        .ok_or_else(|| FontError::Backend("transform stack underflow".into()))?;
                }
                Command::DrawQuad { size, uv } => {
                    let texture = self
                        .bound
                        .ok_or_else(|| FontError::Backend("quad drawn with no texture bound".into()))?;
                    if size[0] <= 0.0 || size[1] <= 0.0 {
                        continue;
                    }
                    self.quads.push(GlyphQuad {
                        texture,
                        rect: Rect { x: self.origin[0], y: self.origin[1], w: size[0], h: size[1] },
                        uv,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<GlyphQuad> {
        self.quads
    }
}

/// Resolve `ids` through `lookup` and execute them in order from `origin`.
pub fn build_quads<'a, F>(origin: [f32; 2], ids: &[ProgramId], mut lookup: F) -> Result<Vec<GlyphQuad>>
where
    F: FnMut(ProgramId) -> Option<&'a GlyphProgram>,
{
    let mut builder = QuadBuilder::new(origin);
    for &id in ids {
        let program = lookup(id).ok_or_else(|| FontError::Backend(format!("unknown program {id:?}")))?;
        builder.execute(program)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance_program(tex: u32, w: f32, adv: f32) -> GlyphProgram {
        let mut p = GlyphProgram::new();
        p.push(Command::BindTexture(TextureId(tex)))
            .push(Command::DrawQuad { size: [w, 8.0], uv: [1.0, 1.0] })
            .push(Command::Translate([adv, 0.0]));
        p
    }

    #[test]
    fn pen_carries_between_programs() {
        let mut b = QuadBuilder::new([10.0, 20.0]);
        b.execute(&advance_program(1, 4.0, 4.0)).unwrap();
        b.execute(&advance_program(2, 4.0, 4.0)).unwrap();
        assert_eq!(b.pen(), [18.0, 20.0]);
        let quads = b.finish();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].rect.x, 10.0);
        assert_eq!(quads[1].rect.x, 14.0);
        assert_eq!(quads[1].texture, TextureId(2));
    }

    #[test]
    fn push_pop_restores_origin() {
        let mut p = GlyphProgram::new();
        p.push(Command::BindTexture(TextureId(0)))
            .push(Command::PushTransform)
            .push(Command::Translate([2.0, -3.0]))
            .push(Command::DrawQuad { size: [4.0, 4.0], uv: [0.5, 0.5] })
            .push(Command::PopTransform)
            .push(Command::Translate([7.0, 0.0]));
        let mut b = QuadBuilder::new([0.0, 0.0]);
        b.execute(&p).unwrap();
        assert_eq!(b.pen(), [7.0, 0.0]);
        assert_eq!(b.finish()[0].rect, Rect { x: 2.0, y: -3.0, w: 4.0, h: 4.0 });
    }

    #[test]
    fn empty_quads_are_dropped() {
        let mut b = QuadBuilder::new([0.0, 0.0]);
        b.execute(&advance_program(0, 0.0, 3.0)).unwrap();
        assert!(b.finish().is_empty());
    }

    #[test]
    fn unbalanced_pop_is_an_error() {
        let mut p = GlyphProgram::new();
        p.push(Command::PopTransform);
        assert!(QuadBuilder::new([0.0, 0.0]).execute(&p).is_err());
    }

    #[test]
    fn unknown_program_is_an_error() {
        let res = build_quads([0.0, 0.0], &[ProgramId(9)], |_| None);
        assert!(matches!(res, Err(FontError::Backend(_))));
    }
}
