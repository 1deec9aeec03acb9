pub mod dbforms;
