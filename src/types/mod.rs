mod compression;
mod key_id;
mod packet;
mod password;
mod s2k;

pub use self::compression::*;
pub use self::key_id::*;
pub use self::packet::*;
pub use self::password::*;
pub use self::s2k::*;
