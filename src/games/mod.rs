pub mod factor;
