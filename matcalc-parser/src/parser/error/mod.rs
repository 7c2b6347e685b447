pub mod kind;

pub use matcalc_error::Error;
