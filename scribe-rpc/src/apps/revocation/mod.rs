mod repository;
pub use repository::IssuerCredRevRepository;
