pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{alias, dim, error, header, info, path, section, success, warn};
pub use table::entries_table;
pub use theme::{Theme, theme};
