pub mod camera;
pub mod game;
pub mod occluders;
pub mod player;

// Re-export commonly used items
pub use camera::ThirdPersonRigPlugin;
pub use game::GamePlugin;
