pub mod binaries;
pub mod keyvalues;
pub mod mdl;
pub mod prelude;
