pub mod cart;
pub mod catalog;
pub mod orders;
pub mod queue;
pub mod reviews;
pub mod slots;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use queue::QueueService;
pub use reviews::ReviewService;
pub use slots::SlotService;
