pub mod readeck;
