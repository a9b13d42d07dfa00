pub mod jsonl_detection_reader;
pub mod stride_detection_source;
