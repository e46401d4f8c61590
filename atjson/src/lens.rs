//! Type-erased field accessors.
//!
//! A lens pairs a shared and a mutable accessor from an owner struct to one of
//! its fields. Erased behind [`Projection`], it lets the metadata store reach a
//! field (or an embedded parent struct) of an instance it only knows as
//! `dyn Any`.

use std::any::Any;
use std::marker::PhantomData;

pub(crate) trait Projection: Send + Sync {
    fn project<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;
    fn project_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

pub(crate) struct Lens<O, V, G, M> {
    get: G,
    get_mut: M,
    _marker: PhantomData<fn(&O) -> &V>,
}

impl<O, V, G, M> Lens<O, V, G, M>
where
    O: Any,
    V: Any,
    G: Fn(&O) -> &V + Send + Sync + 'static,
    M: Fn(&mut O) -> &mut V + Send + Sync + 'static,
{
    pub(crate) fn new(get: G, get_mut: M) -> Self {
        Self {
            get,
            get_mut,
            _marker: PhantomData,
        }
    }

    pub(crate) fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a V> {
        owner.downcast_ref::<O>().map(|o| (self.get)(o))
    }

    pub(crate) fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut V> {
        owner.downcast_mut::<O>().map(|o| (self.get_mut)(o))
    }
}

impl<O, V, G, M> Projection for Lens<O, V, G, M>
where
    O: Any,
    V: Any,
    G: Fn(&O) -> &V + Send + Sync + 'static,
    M: Fn(&mut O) -> &mut V + Send + Sync + 'static,
{
    fn project<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        self.get(owner).map(|v| v as &dyn Any)
    }

    fn project_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.get_mut(owner).map(|v| v as &mut dyn Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Base {
        x: i32,
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
    }

    #[test]
    fn test_lens_projects_embedded_value() {
        let lens = Lens::new(|d: &Derived| &d.base, |d: &mut Derived| &mut d.base);
        let mut derived = Derived::default();

        let base = lens.project_mut(&mut derived).expect("owner type matches");
        base.downcast_mut::<Base>().expect("projected to Base").x = 7;
        assert_eq!(derived.base.x, 7);

        let wrong_owner = Base::default();
        assert!(lens.project(&wrong_owner).is_none());
    }
}
