pub mod net;
pub mod profile;
pub mod proto;
pub mod score;
pub mod timer;

#[cfg(test)]
mod test;
