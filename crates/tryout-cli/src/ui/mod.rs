//! Terminal presentation: [`Theme`] holds colors and icons, [`Output`]
//! renders core events with them.

pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
