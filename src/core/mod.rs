// Path probing, JSON encoding, and error modeling shared by the façade.
pub mod codec;
pub mod error;
pub mod paths;
