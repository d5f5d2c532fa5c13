mod builder;
pub mod handle;
mod slot;

pub use builder::SlotTableBuilder;
pub use handle::{OpenMode, SlotCommand, SlotHandle};
pub use slot::Slot;

#[allow(non_snake_case)]
pub mod Queue {
    #[allow(clippy::module_inception)]
    pub mod Queue;
    pub mod Queue_impl;
    pub mod layout;
    pub use Queue::RecordQueue; // re-export for stable path
}

#[allow(non_snake_case)]
pub mod Structs {
    pub mod Record_Structs;
    pub use Record_Structs::{QueueStats, RecordHeader}; // re-export for stable path
}
