pub mod bitfield;
pub mod buffd;
pub mod clonecell;
pub mod copyhashmap;
pub mod errorfmt;
pub mod numcell;
pub mod queue;
