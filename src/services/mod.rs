pub mod analysis_structured_output;
pub mod dream_analysis_service;
