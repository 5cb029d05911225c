mod accept;
mod connect;
mod finish;
mod read;
mod read_from;
mod read_to_data;
mod write;
mod write_from_data;
mod write_to;

pub(crate) use accept::*;
pub(crate) use connect::*;
pub(crate) use finish::*;
pub(crate) use read::*;
pub(crate) use read_from::*;
pub(crate) use read_to_data::*;
pub(crate) use write::*;
pub(crate) use write_from_data::*;
pub(crate) use write_to::*;
