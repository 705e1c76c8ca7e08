//! Contact signal
//!
//! The world reports the leading edge of every new touch between two
//! fixtures. Ongoing and ending contacts are not reported.

use std::rc::Rc;

use super::world::BodyHandle;
use crate::audio::{AudioSink, SoundEffect};

/// A new touch between two bodies, ordered by handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// Observer registered with a physics world
pub trait ContactListener {
    fn begin_contact(&mut self, contact: &Contact);
}

/// Turns every new contact into a single impact cue, whatever the pair
pub struct ImpactSignal {
    audio: Rc<dyn AudioSink>,
}

impl ImpactSignal {
    pub fn new(audio: Rc<dyn AudioSink>) -> Self {
        Self { audio }
    }
}

impl ContactListener for ImpactSignal {
    fn begin_contact(&mut self, contact: &Contact) {
        log::trace!("Contact began between {:?} and {:?}", contact.a, contact.b);
        self.audio.play(SoundEffect::Impact);
    }
}
