//! Animation System - Timer-Driven Text Animation
//!
//! Two independent loops run while a widget is mounted:
//!
//! ```text
//! Conductor
//!     │
//!     ├─→ Typewriter (foreground)   one reply at a time, cancelled on close/back/mode switch
//!     │       └─→ internal channel  Typing / Complete events, tagged with a RunId
//!     │
//!     └─→ TaglineLooper (background) runs from mount to unmount
//!             └─→ surface channel   Tagline frames, dropped when the surface lags
//! ```
//!
//! Both loops are built on the same primitive: a tick whose delay is drawn
//! from a [`TickRange`], running on its own cancellable task so that
//! stopping one never disturbs the other.

mod tagline;
mod timing;
mod typewriter;

pub use tagline::{
    TaglineLooper, TaglinePhase, TaglineState, TaglineTimings, DEFAULT_TAGLINE_PAUSE,
    FRAME_HEADROOM,
};
pub use timing::{
    schedule, RunId, TaskHandle, TickRange, REPLY_REVEAL, TAGLINE_ERASE, TAGLINE_REVEAL,
};
pub use typewriter::{
    Direction, Typewriter, TypewriterEvent, TypewriterFrame, TypewriterHandle, TypewriterRun,
};
