//! Effect parameters and the virtual-to-physical broadcast graph.
//!
//! A *physical* parameter mirrors a constant inside one compiled effect. A *virtual* parameter is
//! owned by the core and has no hardware backing; it exists so one write can reach many effects.
//! Attachments are one-directional: writing a virtual parameter pushes the value into every
//! attached parameter, never the other way around.
//!
//! Attached parameters are held weakly, so an effect going away drops out of every broadcast list
//! without an explicit detach.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;

use crate::annotation::Annotations;
use crate::error::{CoreError, CoreResult};
use crate::texture::TextureRef;
use crate::types::{ParameterCategory, ParameterHandle, ParameterType};

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Vector components or a row-major 4x4 matrix.
    Floats(Vec<f32>),
    Texture(Option<TextureRef>),
    Empty,
}

impl ParameterValue {
    fn initial(ty: ParameterType) -> Self {
        match ty.category() {
            ParameterCategory::Float | ParameterCategory::Matrix => ParameterValue::Floats(vec![0.0; ty.components()]),
            ParameterCategory::Sampler => ParameterValue::Texture(None),
            ParameterCategory::Unknown => ParameterValue::Empty,
        }
    }
}

#[derive(Debug)]
enum Binding {
    Virtual,
    Physical {
        handle: ParameterHandle,
        annotations: Annotations,
    },
}

pub struct Parameter {
    name: String,
    ty: ParameterType,
    binding: Binding,
    value: RefCell<ParameterValue>,
    attached: RefCell<Vec<Weak<Parameter>>>,
    dirty: Cell<bool>,
}

pub type ParameterRef = Rc<Parameter>;

impl Parameter {
    pub fn new_virtual(name: impl Into<String>, ty: ParameterType) -> ParameterRef {
        Self::build(name.into(), ty, Binding::Virtual)
    }

    pub fn new_physical(
        name: impl Into<String>,
        ty: ParameterType,
        handle: ParameterHandle,
        annotations: Annotations,
    ) -> ParameterRef {
        Self::build(name.into(), ty, Binding::Physical { handle, annotations })
    }

    fn build(name: String, ty: ParameterType, binding: Binding) -> ParameterRef {
        Rc::new(Self {
            name,
            ty,
            binding,
            value: RefCell::new(ParameterValue::initial(ty)),
            attached: RefCell::new(Vec::new()),
            dirty: Cell::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ParameterType {
        self.ty
    }

    pub fn category(&self) -> ParameterCategory {
        self.ty.category()
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.binding, Binding::Virtual)
    }

    /// Hardware handle of a physical parameter.
    pub fn handle(&self) -> Option<ParameterHandle> {
        match self.binding {
            Binding::Physical { handle, .. } => Some(handle),
            Binding::Virtual => None,
        }
    }

    /// Source annotations; always empty for virtual parameters.
    pub fn annotations(&self) -> &Annotations {
        static EMPTY: Annotations = Annotations::EMPTY;
        match &self.binding {
            Binding::Physical { annotations, .. } => annotations,
            Binding::Virtual => &EMPTY,
        }
    }

    pub fn value(&self) -> ParameterValue {
        self.value.borrow().clone()
    }

    pub fn floats(&self) -> Vec<f32> {
        match &*self.value.borrow() {
            ParameterValue::Floats(values) => values.clone(),
            _ => Vec::new(),
        }
    }

    pub fn texture(&self) -> Option<TextureRef> {
        match &*self.value.borrow() {
            ParameterValue::Texture(texture) => texture.clone(),
            _ => None,
        }
    }

    /// Writes the leading components of a vector or matrix parameter.
    pub fn set_floats(&self, values: &[f32]) -> CoreResult<()> {
        let components = self.ty.components();
        if components == 0 {
            return Err(self.type_mismatch(ParameterType::Float4));
        }
        if values.is_empty() || values.len() > components {
            return Err(CoreError::ValueSize {
                name: self.name.clone(),
                got: values.len(),
            });
        }
        let mut next = self.floats();
        next[..values.len()].copy_from_slice(values);
        self.store(ParameterValue::Floats(next));
        Ok(())
    }

    pub fn set_matrix(&self, matrix: &[f32; 16]) -> CoreResult<()> {
        if self.ty != ParameterType::Matrix {
            return Err(self.type_mismatch(ParameterType::Matrix));
        }
        self.set_floats(matrix)
    }

    pub fn set_texture(&self, texture: Option<TextureRef>) -> CoreResult<()> {
        if self.category() != ParameterCategory::Sampler {
            return Err(self.type_mismatch(ParameterType::Sampler2D));
        }
        self.store(ParameterValue::Texture(texture));
        Ok(())
    }

    fn type_mismatch(&self, expected: ParameterType) -> CoreError {
        CoreError::TypeMismatch {
            name: self.name.clone(),
            expected,
            actual: self.ty,
        }
    }

    fn store(&self, value: ParameterValue) {
        *self.value.borrow_mut() = value.clone();
        self.dirty.set(true);
        for target in self.attached() {
            target.store(value.clone());
        }
    }

    /// Adds `target` to this parameter's broadcast list.
    ///
    /// Only virtual parameters accept attachments, both ends must share a type, and an
    /// attachment that would close a cycle is refused.
    pub fn attach(&self, target: &ParameterRef) -> CoreResult<()> {
        if !self.is_virtual() {
            tracing::warn!(source = %self.name, target = %target.name, "attach to a physical parameter");
            return Err(CoreError::NotVirtual(self.name.clone()));
        }
        if target.ty != self.ty {
            return Err(CoreError::TypeMismatch {
                name: target.name.clone(),
                expected: self.ty,
                actual: target.ty,
            });
        }
        if std::ptr::eq(self, Rc::as_ptr(target)) || target.reaches(self) {
            return Err(CoreError::AttachmentCycle(target.name.clone()));
        }

        let mut attached = self.attached.borrow_mut();
        attached.retain(|weak| weak.strong_count() > 0);
        if !attached.iter().any(|weak| weak.as_ptr() == Rc::as_ptr(target)) {
            attached.push(Rc::downgrade(target));
        }
        Ok(())
    }

    /// Returns whether `target` was attached.
    pub fn detach(&self, target: &Parameter) -> bool {
        let mut attached = self.attached.borrow_mut();
        let found = attached.iter().any(|weak| std::ptr::eq(weak.as_ptr(), target));
        attached.retain(|weak| weak.strong_count() > 0 && !std::ptr::eq(weak.as_ptr(), target));
        found
    }

    /// Detaches every target at once, returning how many were live.
    pub fn detach_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.attached.borrow_mut());
        drained.iter().filter(|weak| weak.strong_count() > 0).count()
    }

    /// Live attached parameters.
    pub fn attached(&self) -> Vec<ParameterRef> {
        self.attached.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    fn reaches(&self, needle: &Parameter) -> bool {
        self.attached()
            .iter()
            .any(|next| std::ptr::eq(Rc::as_ptr(next), needle) || next.reaches(needle))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Clears the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("virtual", &self.is_virtual())
            .field("value", &*self.value.borrow())
            .finish()
    }
}

/// The core-wide table of virtual parameters effects link against by name.
#[derive(Debug, Default)]
pub struct GlobalParameters {
    parameters: HashMap<String, ParameterRef>,
}

impl GlobalParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str, ty: ParameterType) -> CoreResult<ParameterRef> {
        if self.parameters.contains_key(name) {
            return Err(CoreError::DuplicateParameter(name.to_owned()));
        }
        let parameter = Parameter::new_virtual(name, ty);
        self.parameters.insert(name.to_owned(), parameter.clone());
        Ok(parameter)
    }

    /// Looks up a global, which must have type `ty`.
    pub fn get(&self, name: &str, ty: ParameterType) -> Option<ParameterRef> {
        let parameter = self.parameters.get(name)?;
        if parameter.ty() != ty {
            tracing::debug!(name, wanted = ?ty, actual = ?parameter.ty(), "global parameter type differs");
            return None;
        }
        Some(parameter.clone())
    }

    /// Removes a global and detaches everything linked to it.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.parameters.remove(name) {
            Some(parameter) => {
                parameter.detach_all();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn physical(name: &str, ty: ParameterType) -> ParameterRef {
        Parameter::new_physical(name, ty, ParameterHandle(1), Annotations::new())
    }

    #[test]
    fn writes_reach_attached_parameters() {
        let global = Parameter::new_virtual("tint", ParameterType::Float3);
        let a = physical("a", ParameterType::Float3);
        let b = physical("b", ParameterType::Float3);
        global.attach(&a).unwrap();
        global.attach(&b).unwrap();

        global.set_floats(&[0.25, 0.5, 1.0]).unwrap();
        assert_eq!(a.floats(), vec![0.25, 0.5, 1.0]);
        assert_eq!(b.floats(), vec![0.25, 0.5, 1.0]);
        assert!(a.take_dirty());
        assert!(!a.is_dirty());
    }

    #[test]
    fn detach_all_stops_propagation() {
        let global = Parameter::new_virtual("tint", ParameterType::Float2);
        let a = physical("a", ParameterType::Float2);
        let b = physical("b", ParameterType::Float2);
        global.attach(&a).unwrap();
        global.attach(&b).unwrap();
        global.set_floats(&[1.0, 2.0]).unwrap();

        assert_eq!(global.detach_all(), 2);
        global.set_floats(&[3.0, 4.0]).unwrap();
        assert_eq!(a.floats(), vec![1.0, 2.0]);
        assert_eq!(b.floats(), vec![1.0, 2.0]);
        assert!(global.attached().is_empty());
    }

    #[test]
    fn physical_parameters_refuse_attachments() {
        let a = physical("a", ParameterType::Float1);
        let b = physical("b", ParameterType::Float1);
        let err = a.attach(&b).expect_err("physical source");
        assert!(matches!(err, CoreError::NotVirtual(name) if name == "a"));
    }

    #[test]
    fn attachment_requires_matching_types() {
        let global = Parameter::new_virtual("m", ParameterType::Matrix);
        let v = physical("v", ParameterType::Float4);
        assert!(matches!(global.attach(&v), Err(CoreError::TypeMismatch { .. })));
    }

    #[test]
    fn cycles_between_virtual_parameters_are_refused() {
        let a = Parameter::new_virtual("a", ParameterType::Float1);
        let b = Parameter::new_virtual("b", ParameterType::Float1);
        a.attach(&b).unwrap();
        assert!(b.attach(&a).is_err());
        assert!(a.attach(&a).is_err());
    }

    #[test]
    fn globals_are_typed_and_unique() {
        let mut globals = GlobalParameters::new();
        let view = globals.create("matrix_view", ParameterType::Matrix).unwrap();
        assert!(matches!(
            globals.create("matrix_view", ParameterType::Matrix),
            Err(CoreError::DuplicateParameter(_))
        ));
        assert!(globals.get("matrix_view", ParameterType::Float4).is_none());
        assert!(Rc::ptr_eq(&globals.get("matrix_view", ParameterType::Matrix).unwrap(), &view));

        let linked = physical("view", ParameterType::Matrix);
        view.attach(&linked).unwrap();
        assert!(globals.remove("matrix_view"));
        assert!(view.attached().is_empty());
    }

    #[test]
    fn dropped_targets_leave_the_broadcast_list() {
        let global = Parameter::new_virtual("t", ParameterType::Float1);
        let a = physical("a", ParameterType::Float1);
        global.attach(&a).unwrap();
        drop(a);
        assert!(global.attached().is_empty());
        global.set_floats(&[1.0]).unwrap();
    }

    #[test]
    fn partial_writes_keep_trailing_components() {
        let p = physical("p", ParameterType::Float4);
        p.set_floats(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        p.set_floats(&[9.0]).unwrap();
        assert_eq!(p.floats(), vec![9.0, 2.0, 3.0, 4.0]);
        assert!(matches!(p.set_floats(&[0.0; 5]), Err(CoreError::ValueSize { got: 5, .. })));
        assert!(matches!(p.set_texture(None), Err(CoreError::TypeMismatch { .. })));
    }
}
