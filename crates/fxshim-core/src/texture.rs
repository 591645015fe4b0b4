//! Named textures shared between effects.

use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{TextureDesc, TextureHandle, TextureStage};

/// A native texture registered with the core under a unique name.
///
/// The native object belongs to the adapter that created it; the core only hands out shared
/// references so that one effect can read what another effect's technique wrote.
#[derive(PartialEq, Eq)]
pub struct Texture {
    name: String,
    handle: TextureHandle,
    desc: TextureDesc,
}

pub type TextureRef = Rc<Texture>;

impl Texture {
    pub fn new(name: impl Into<String>, handle: TextureHandle, desc: TextureDesc) -> TextureRef {
        Rc::new(Self {
            name: name.into(),
            handle,
            desc,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture({} {:#x})", self.name, self.handle.0)
    }
}

/// Core-wide texture namespace plus the per-stage fallback textures.
#[derive(Debug, Default)]
pub struct TextureTable {
    textures: HashMap<String, TextureRef>,
    stages: HashMap<TextureStage, TextureRef>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, texture: TextureRef) -> CoreResult<()> {
        if self.textures.contains_key(texture.name()) {
            return Err(CoreError::DuplicateTexture(texture.name().to_owned()));
        }
        tracing::debug!(name = texture.name(), "texture registered");
        self.textures.insert(texture.name().to_owned(), texture);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<TextureRef> {
        self.textures.get(name).cloned()
    }

    /// Unregisters a texture, clearing any stage it was bound to.
    pub fn remove(&mut self, name: &str) -> Option<TextureRef> {
        let texture = self.textures.remove(name)?;
        self.stages.retain(|_, bound| !Rc::ptr_eq(bound, &texture));
        Some(texture)
    }

    pub fn set_stage(&mut self, stage: TextureStage, texture: Option<TextureRef>) {
        match texture {
            Some(texture) => {
                self.stages.insert(stage, texture);
            }
            None => {
                self.stages.remove(&stage);
            }
        }
    }

    pub fn stage(&self, stage: TextureStage) -> Option<TextureRef> {
        self.stages.get(&stage).cloned()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(String::as_str)
    }

    /// Empties the table, returning every texture so the owner can release them.
    pub fn drain(&mut self) -> Vec<TextureRef> {
        self.stages.clear();
        self.textures.drain().map(|(_, texture)| texture).collect()
    }
}
