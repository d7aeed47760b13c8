pub mod block;
pub mod brightness_scanner;
pub mod coordinate_mapper;
pub mod pixel;
pub mod pixel_buffer;
pub mod point;
pub mod utils;
