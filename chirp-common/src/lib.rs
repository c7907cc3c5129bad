pub mod model;
pub mod route;
pub mod util;
