#[cfg(feature = "derive")]
mod component_derive_test {
    use scenewire_di::component::{Inject, InjectionStrategy, ObjectKind};
    use scenewire_di::component_registry::{DescriptorRegistry, StaticDescriptorRegistry};
    use scenewire_di::instance_provider::{InstanceAnyPtr, InstancePtr};
    use scenewire_di::{injectable, injectable_alias, Injectable};
    use std::any::TypeId;

    #[injectable]
    trait Engine {
        fn power(&self) -> u32;
    }

    #[injectable]
    trait Horn {
        fn honk(&self) -> &'static str;
    }

    #[derive(Injectable, Default)]
    #[scenewire(default, global = [dyn Engine, Diesel], persistent)]
    struct Diesel;

    impl Engine for Diesel {
        fn power(&self) -> u32 {
            150
        }
    }

    #[derive(Injectable)]
    #[scenewire(component, constructor = "Wheel::spare")]
    struct Wheel {
        size: u8,
    }

    impl Wheel {
        fn spare() -> Self {
            Self { size: 15 }
        }
    }

    #[derive(Injectable, Default)]
    #[scenewire(component, receiver, default, global)]
    struct Chassis {
        #[inject]
        engine: Inject<dyn Engine>,
        #[inject(up_in_hierarchy)]
        wheel: Inject<Wheel>,
        _label: String,
    }

    #[injectable_alias]
    impl Horn for Chassis {
        fn honk(&self) -> &'static str {
            "beep"
        }
    }

    #[derive(Injectable, Default)]
    #[scenewire(component, receiver, default)]
    struct Truck {
        #[inject(base)]
        chassis: Chassis,
        #[inject(unique)]
        spare_engine: Inject<Diesel>,
        #[inject(down_in_hierarchy)]
        wheel: Inject<Wheel>,
    }

    #[derive(Injectable, Default)]
    #[scenewire(receiver)]
    struct Trailer(#[inject(global)] Inject<dyn Engine>, u8);

    fn create_registry() -> StaticDescriptorRegistry {
        StaticDescriptorRegistry::new().unwrap()
    }

    #[test]
    fn should_register_all_types() {
        let registry = create_registry();
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn should_register_global_injectable() {
        let registry = create_registry();
        let descriptor = registry.descriptor(TypeId::of::<Diesel>()).unwrap();

        assert_eq!(descriptor.kind, ObjectKind::Object);
        assert!(descriptor.constructor.is_some());
        assert!(descriptor.receiver.is_none());

        let injectable = descriptor.injectable.as_ref().unwrap();
        assert!(injectable.is_persistent);
        assert_eq!(
            injectable
                .targets
                .iter()
                .map(|target| target.type_id)
                .collect::<Vec<_>>(),
            vec![TypeId::of::<dyn Engine>(), TypeId::of::<Diesel>()]
        );

        let engine = registry
            .cast(
                &(InstancePtr::new(Diesel) as InstanceAnyPtr),
                TypeId::of::<dyn Engine>(),
            )
            .unwrap()
            .downcast::<InstancePtr<dyn Engine>>()
            .unwrap_or_else(|_| panic!("invalid cast"));
        assert_eq!(engine.power(), 150);
    }

    #[test]
    fn should_use_custom_constructor() {
        let registry = create_registry();
        let descriptor = registry.descriptor(TypeId::of::<Wheel>()).unwrap();

        assert!(descriptor.is_component());
        assert!(descriptor.injectable.is_none());

        let wheel = (descriptor.constructor.unwrap())()
            .downcast::<Wheel>()
            .unwrap_or_else(|_| panic!("invalid instance"));
        assert_eq!(wheel.size, 15);
    }

    #[test]
    fn should_register_receiver_fields() {
        let registry = create_registry();
        let receiver = registry.receiver(TypeId::of::<Chassis>()).unwrap();

        assert!(receiver.base.is_none());
        assert_eq!(
            receiver
                .fields
                .iter()
                .map(|field| (field.name, field.strategy, field.target_type))
                .collect::<Vec<_>>(),
            vec![
                (
                    "engine",
                    InjectionStrategy::Global,
                    TypeId::of::<dyn Engine>()
                ),
                (
                    "wheel",
                    InjectionStrategy::UpInHierarchy,
                    TypeId::of::<Wheel>()
                ),
            ]
        );

        let chassis = Chassis::default();
        assert!((receiver.fields[0].accessor)(&chassis).is_some());
        assert!((receiver.fields[0].accessor)(&Diesel).is_none());
    }

    #[test]
    fn should_register_embedded_base() {
        let registry = create_registry();
        let receiver = registry.receiver(TypeId::of::<Truck>()).unwrap();
        let base = receiver.base.unwrap();

        assert_eq!(base.type_id, TypeId::of::<Chassis>());
        assert_eq!(receiver.fields.len(), 2);
        assert_eq!(receiver.fields[0].strategy, InjectionStrategy::Unique);
        assert_eq!(
            receiver.fields[1].strategy,
            InjectionStrategy::DownInHierarchy
        );

        let truck = Truck::default();
        assert!((base.accessor)(&truck)
            .and_then(|base| base.downcast_ref::<Chassis>())
            .is_some());
    }

    #[test]
    fn should_register_tuple_fields() {
        let registry = create_registry();
        let descriptor = registry.descriptor(TypeId::of::<Trailer>()).unwrap();

        assert!(descriptor.constructor.is_none());
        assert_eq!(
            descriptor.receiver.as_ref().unwrap().fields[0].name,
            "0"
        );
    }

    #[test]
    fn should_register_aliases() {
        let registry = create_registry();
        let chassis = InstancePtr::new(Chassis::default()) as InstanceAnyPtr;

        assert!(registry.can_cast(&chassis, TypeId::of::<Chassis>()));
        assert!(!registry.can_cast(&chassis, TypeId::of::<dyn Engine>()));

        let horn = registry
            .cast(&chassis, TypeId::of::<dyn Horn>())
            .unwrap()
            .downcast::<InstancePtr<dyn Horn>>()
            .unwrap_or_else(|_| panic!("invalid cast"));
        assert_eq!(horn.honk(), "beep");
    }
}
