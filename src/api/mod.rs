pub mod osf;
