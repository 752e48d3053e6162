// Adapters layer: concrete auth and data backends behind the domain ports.

pub mod memory;
pub mod supabase;

pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;
