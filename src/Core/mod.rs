pub mod futex;
pub mod interrupt;
pub mod lock;
pub mod table;
pub mod wait;

pub use interrupt::Interrupt;
pub use table::{InitPolicy, SlotConfig, SlotTable};
