mod debug_log;
mod feedback;
mod now;
mod quotes;

pub use debug_log::DebugLog;
pub use feedback::save_screenshot;
pub use now::{NowSnapshot, NowStore, NowUpdate};
pub use quotes::{NewQuote, Quote, QuoteStore};
