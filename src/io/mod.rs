pub mod edge_weights;
pub mod instance_reader;
pub mod tokenizer;
