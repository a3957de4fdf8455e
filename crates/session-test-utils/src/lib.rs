//! # Session Test Utilities
//!
//! Shared test utilities for the meeting session coordinator.
//!
//! This crate provides mock implementations and test fixtures for
//! driving a coordinator without a real media engine or join service.
//!
//! ## Modules
//!
//! - `mock_engine` - Recording media engine and camera
//! - `mock_api` - Join/leave service with canned responses
//! - `fixtures` - Tile states, roster entries and join responses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let engine = MockMediaEngine::accepting();
//!     let (handle, mut views, _task) = SessionCoordinator::spawn(
//!         engine.clone(),
//!         None,
//!         CoordinatorOptions::default(),
//!         CancellationToken::new(),
//!     );
//!
//!     handle.send_event(TestTile::remote(1).added()).await.unwrap();
//!     let update = views.recv().await.unwrap();
//!     assert_eq!(update.model.visible_ids(), vec![1]);
//! }
//! ```

pub mod fixtures;
pub mod mock_api;
pub mod mock_engine;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_api::*;
pub use mock_engine::*;
