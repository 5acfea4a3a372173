//! Display sinks.
//!
//! A sink is the boundary to whatever actually shows the capsule (a system
//! notification, a status bar module, a terminal). The publisher decides
//! *when* to publish; sinks only render.

use std::io::Write;

use anyhow::Result;

use crate::frame::CapsuleFrame;

pub trait DisplaySink {
    fn publish(&mut self, frame: &CapsuleFrame) -> Result<()>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn publish(&mut self, frame: &CapsuleFrame) -> Result<()> {
        (**self).publish(frame)
    }
}

/// Line-oriented text sink: one `title | short_text [progress%]` line per frame.
pub struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for WriterSink<W> {
    fn publish(&mut self, frame: &CapsuleFrame) -> Result<()> {
        match frame.progress {
            Some(p) => writeln!(self.out, "{} | {} [{p:>3}%]", frame.title, frame.short_text)?,
            None => writeln!(self.out, "{} | {}", frame.title, frame.short_text)?,
        }
        self.out.flush()?;
        Ok(())
    }
}

/// In-memory sink keeping every published frame.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    frames: Vec<CapsuleFrame>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[CapsuleFrame] {
        &self.frames
    }

    pub fn take(&mut self) -> Vec<CapsuleFrame> {
        std::mem::take(&mut self.frames)
    }
}

impl DisplaySink for RecordingSink {
    fn publish(&mut self, frame: &CapsuleFrame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}
