// Module naming follows project convention (MailSlot = the per-channel record slot)
pub mod error;
pub use error::{SlotError, SlotResult};

#[allow(non_snake_case)]
pub mod MailSlot;
pub use MailSlot::{OpenMode, Slot, SlotCommand, SlotHandle, SlotTableBuilder};

#[allow(non_snake_case)]
pub mod Core;
pub use Core::{InitPolicy, Interrupt, SlotConfig, SlotTable};

#[allow(non_snake_case)]
pub mod Debug {
    #[allow(non_snake_case)]
    pub mod StructDebug;
}
