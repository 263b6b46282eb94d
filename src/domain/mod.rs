pub mod kol;
pub mod page;
