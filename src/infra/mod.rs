pub mod nrel;
