mod build;
mod decrypt;
mod envelope;
mod objects;

pub use self::build::*;
pub use self::decrypt::*;
pub use self::envelope::*;
pub use self::objects::*;
