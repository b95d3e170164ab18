pub mod configure;
pub mod frame;

pub use configure::{Configuration, ConfigureDisposition};
pub use frame::{
    ContentLimits, DecorVisibility, DecorationMode, Frame, FrameStatus, StateChange, WindowState,
    DEFAULT_FLOATING_HEIGHT, DEFAULT_FLOATING_WIDTH,
};
