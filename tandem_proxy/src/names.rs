// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Well-known property names shared by views, representations and links.

/// Representations shown by a view (a [`Proxies`](crate::PropertyValue::Proxies) list).
pub const REPRESENTATIONS: &str = "Representations";
/// Whether a representation takes part in view updates.
pub const VISIBILITY: &str = "Visibility";
/// Upstream data of a representation or filter.
pub const INPUT: &str = "Input";

/// Resource-side cache forcing. While the pushed value is `true`, dirty marks are absorbed.
pub const FORCE_USE_CACHE: &str = "ForceUseCache";
/// Key selecting the cached result of a representation.
pub const CACHE_KEY: &str = "CacheKey";

/// Pixel size of a view.
pub const VIEW_SIZE: &str = "ViewSize";
/// Pixel position of a view within its layout.
pub const VIEW_POSITION: &str = "ViewPosition";
/// Time a view displays.
pub const VIEW_TIME: &str = "ViewTime";

/// Camera eye position.
pub const CAMERA_POSITION: &str = "CameraPosition";
/// Camera focal point.
pub const CAMERA_FOCAL_POINT: &str = "CameraFocalPoint";
/// Camera up vector.
pub const CAMERA_VIEW_UP: &str = "CameraViewUp";
/// Camera view angle in degrees.
pub const CAMERA_VIEW_ANGLE: &str = "CameraViewAngle";
/// Camera parallel scale.
pub const CAMERA_PARALLEL_SCALE: &str = "CameraParallelScale";
/// Center of rotation for interaction.
pub const CENTER_OF_ROTATION: &str = "CenterOfRotation";

/// Every camera property, in the order they are mirrored.
pub const CAMERA_PROPERTIES: [&str; 6] = [
    CAMERA_POSITION,
    CAMERA_FOCAL_POINT,
    CAMERA_VIEW_UP,
    CAMERA_VIEW_ANGLE,
    CAMERA_PARALLEL_SCALE,
    CENTER_OF_ROTATION,
];
