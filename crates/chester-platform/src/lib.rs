pub mod llm;
pub mod supabase;
pub mod memory;
