//! Class registration: table layout, flags and the initialize lifecycle

mod common;

use classbridge::flags::acc;
use classbridge::sdk::{CallResult, Parameters, Value};
use classbridge::{
    Argument, Arguments, Base, BridgeError, Callback, ClassDescriptor, ClassFlags, MethodFlags,
    TypeHint, UsageError,
};
use common::RecordingHost;

#[derive(Default)]
struct Widget {
    size: i64,
}

impl Base for Widget {}

impl Widget {
    fn reset(&mut self) -> CallResult<()> {
        self.size = 0;
        Ok(())
    }

    fn resize(&mut self, params: &Parameters) -> CallResult<()> {
        self.size = params.get_as(0)?;
        Ok(())
    }

    fn size(&mut self) -> CallResult<Value> {
        Ok(Value::int(self.size))
    }
}

fn widget_with(n: usize) -> ClassDescriptor<Widget> {
    let mut class = ClassDescriptor::new("Widget");
    for i in 0..n {
        class
            .method(format!("m{i}"), Callback::NoArgs(Widget::reset))
            .unwrap();
    }
    class
}

#[test]
fn test_table_has_n_plus_one_entries_in_insertion_order() {
    for n in [0usize, 1, 2, 7, 32] {
        let mut host = RecordingHost::new();
        let mut class = widget_with(n);
        class.initialize(&mut host).unwrap();

        let table = class.table().unwrap();
        assert_eq!(table.len(), n + 1);
        for (i, entry) in table[..n].iter().enumerate() {
            let name = unsafe { entry.name() }.unwrap().to_str().unwrap();
            assert_eq!(name, format!("m{i}"));
            assert!(entry.handler.is_some());
        }
        assert!(table[n].is_sentinel());
        assert!(table[n].name.is_null());
        assert!(table[n].handler.is_none());
        assert!(table[n].arg_info.is_null());
        assert_eq!(table[n].flags, 0);

        // the host sees the same table, not a copy
        let declared = host.class("Widget");
        assert_eq!(declared.functions, class.table().unwrap().as_ptr());
        assert_eq!(declared.entries().len(), n);

        class.shutdown(&mut host).unwrap();
    }
}

#[test]
fn test_protected_final_flags() {
    let mut host = RecordingHost::new();
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    class
        .add(
            "reset",
            Callback::NoArgs(Widget::reset),
            MethodFlags::PROTECTED | MethodFlags::FINAL,
            Arguments::new(),
        )
        .unwrap()
        .method("size", Callback::NoArgsReturn(Widget::size))
        .unwrap()
        .add(
            "grow",
            Callback::Params(Widget::resize),
            MethodFlags::PRIVATE | MethodFlags::ABSTRACT,
            Arguments::new(),
        )
        .unwrap();
    class.initialize(&mut host).unwrap();

    let declared = host.class("Widget");
    assert_eq!(declared.entry("reset").flags, acc::PROTECTED | acc::FINAL);
    assert_eq!(declared.entry("reset").flags, 0x204);
    assert_eq!(declared.entry("size").flags, acc::PUBLIC);
    assert_eq!(declared.entry("grow").flags, acc::PRIVATE | acc::ABSTRACT);

    class.shutdown(&mut host).unwrap();
}

#[test]
fn test_class_flags_reach_host() {
    let mut host = RecordingHost::new();
    let mut class = ClassDescriptor::<Widget>::with_flags("Widget", ClassFlags::FINAL).unwrap();
    class.initialize(&mut host).unwrap();
    assert_eq!(host.class("Widget").flags, acc::FINAL_CLASS);
    class.shutdown(&mut host).unwrap();
}

#[test]
fn test_conflicting_visibility_is_rejected() {
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    let err = class
        .add(
            "reset",
            Callback::NoArgs(Widget::reset),
            MethodFlags::PUBLIC | MethodFlags::PRIVATE,
            Arguments::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err.as_usage(),
        Some(UsageError::ConflictingVisibility { .. })
    ));
    assert_eq!(class.method_count(), 0);
}

#[test]
fn test_static_method_is_rejected() {
    let mut host = RecordingHost::new();
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    let err = class
        .add(
            "size",
            Callback::NoArgsReturn(Widget::size),
            MethodFlags::STATIC,
            Arguments::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err.as_usage(),
        Some(UsageError::StaticMethod(method)) if method == "size"
    ));
    assert_eq!(class.method_count(), 0);

    // nothing reaches the host that could only fail when called
    class.initialize(&mut host).unwrap();
    assert!(host.class("Widget").entries().is_empty());
    class.shutdown(&mut host).unwrap();
}

#[test]
fn test_second_initialize_fails_and_keeps_handle() {
    let mut host = RecordingHost::new();
    let mut class = widget_with(3);

    let entry = class.initialize(&mut host).unwrap();
    let table = class.table().unwrap().as_ptr();

    let err = class.initialize(&mut host).unwrap_err();
    assert!(matches!(
        err.as_usage(),
        Some(UsageError::AlreadyInitialized(name)) if name == "Widget"
    ));
    assert_eq!(class.class_entry(), Some(entry));
    assert_eq!(class.table().unwrap().as_ptr(), table);
    assert_eq!(host.declare_calls, 1);

    class.shutdown(&mut host).unwrap();
    assert_eq!(host.released, ["Widget"]);
}

#[test]
fn test_add_after_initialize_fails() {
    let mut host = RecordingHost::new();
    let mut class = widget_with(1);
    class.initialize(&mut host).unwrap();

    let err = class
        .method("late", Callback::NoArgs(Widget::reset))
        .unwrap_err();
    assert!(matches!(
        err.as_usage(),
        Some(UsageError::AddAfterInitialize { method, .. }) if method == "late"
    ));
    assert_eq!(class.table().unwrap().len(), 2);

    class.shutdown(&mut host).unwrap();
    assert!(class.method("later", Callback::NoArgs(Widget::reset)).is_err());
}

#[test]
fn test_host_rejection_leaves_nothing_registered() {
    let mut host = RecordingHost::new();
    host.reject = Some("Widget".to_string());
    let mut class = widget_with(2);

    let err = class.initialize(&mut host).unwrap_err();
    assert!(matches!(err, BridgeError::HostRejected { ref class, .. } if class == "Widget"));
    assert!(err.to_string().contains("refused"));
    assert!(!class.is_initialized());
    assert!(class.table().is_none());
    assert!(class.class_entry().is_none());
    assert!(!host.is_declared("Widget"));

    // the descriptor is still usable
    class.method("extra", Callback::NoArgs(Widget::reset)).unwrap();
    host.reject = None;
    class.initialize(&mut host).unwrap();
    assert_eq!(host.class("Widget").entries().len(), 3);
    class.shutdown(&mut host).unwrap();
}

#[test]
fn test_duplicate_method_names_rejected_by_host() {
    let mut host = RecordingHost::new();
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    class
        .method("size", Callback::NoArgsReturn(Widget::size))
        .unwrap()
        .method("Size", Callback::NoArgsReturn(Widget::size))
        .unwrap();

    let err = class.initialize(&mut host).unwrap_err();
    assert!(err.to_string().contains("redeclare"));
    assert!(!class.is_initialized());
}

#[test]
fn test_duplicate_class_rejected_by_host() {
    let mut host = RecordingHost::new();
    let mut first = widget_with(1);
    let mut second = widget_with(1);
    first.initialize(&mut host).unwrap();
    assert!(second.initialize(&mut host).is_err());
    first.shutdown(&mut host).unwrap();
    second.initialize(&mut host).unwrap();
    second.shutdown(&mut host).unwrap();
}

#[test]
fn test_invalid_names() {
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    assert!(matches!(
        class.method("", Callback::NoArgs(Widget::reset)),
        Err(BridgeError::InvalidName(_))
    ));
    assert!(matches!(
        class.method("a\0b", Callback::NoArgs(Widget::reset)),
        Err(BridgeError::InvalidName(_))
    ));

    let mut host = RecordingHost::new();
    let mut nameless = ClassDescriptor::<Widget>::new("");
    assert!(matches!(
        nameless.initialize(&mut host),
        Err(BridgeError::InvalidName(_))
    ));
    assert_eq!(host.declare_calls, 0);
}

#[test]
fn test_argument_info_in_table() {
    let mut host = RecordingHost::new();
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    class
        .add(
            "resize",
            Callback::Params(Widget::resize),
            MethodFlags::empty(),
            Arguments::new()
                .with(Argument::required("size").typed(TypeHint::Int))
                .with(Argument::optional("unit").nullable()),
        )
        .unwrap();
    class.initialize(&mut host).unwrap();

    let entry = host.class("Widget").entry("resize");
    let header = unsafe { &*entry.arg_info };
    assert_eq!(header.method, class.method_ids().unwrap()[0].to_raw());
    assert_eq!(header.num_args, 2);
    assert_eq!(header.required_num_args, 1);
    let infos = unsafe { std::slice::from_raw_parts(header.args, 2) };
    let first = unsafe { std::ffi::CStr::from_ptr(infos[0].name) };
    assert_eq!(first.to_str().unwrap(), "size");
    assert_eq!(infos[0].type_hint, TypeHint::Int as u8);
    assert_eq!(infos[1].allow_null, 1);

    class.shutdown(&mut host).unwrap();
}

#[test]
fn test_required_after_optional_rejected() {
    let mut class = ClassDescriptor::<Widget>::new("Widget");
    let err = class
        .add(
            "resize",
            Callback::Params(Widget::resize),
            MethodFlags::empty(),
            Arguments::new()
                .with(Argument::optional("unit"))
                .with(Argument::required("size")),
        )
        .unwrap_err();
    assert!(matches!(
        err.as_usage(),
        Some(UsageError::RequiredAfterOptional { .. })
    ));
}

#[test]
fn test_shutdown_releases_method_identities() {
    let mut host = RecordingHost::new();
    let mut class = widget_with(2);
    class.initialize(&mut host).unwrap();
    let ids = class.method_ids().unwrap().to_vec();
    assert!(ids.iter().all(|id| classbridge::arena::is_live(*id)));

    class.shutdown(&mut host).unwrap();
    assert!(ids.iter().all(|id| !classbridge::arena::is_live(*id)));
    assert!(class.method_ids().is_none());
}
