pub mod sheet_rows;
pub mod simplefin;
