pub mod analysis;
pub mod db;
