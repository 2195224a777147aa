mod check_tool;
mod info;
mod package;

pub use check_tool::cmd_check_tool;
pub use info::cmd_info;
pub use package::{PackageArgs, cmd_package};
