//! The legacy interface objects handed to the application.

mod device8;
mod direct3d8;
mod hook;
mod resources;
mod shaders;
mod slot;

pub use device8::Device8;
pub use direct3d8::{Direct3D8, NATIVE_SDK_VERSION};
pub use hook::{FrameHook, NoHook};
pub use resources::{
    CubeTexture8, IndexBuffer8, Surface8, SwapChain8, Texture8, VertexBuffer8, Volume8, VolumeTexture8,
};
pub use slot::{ComSlot, RefCounted};
