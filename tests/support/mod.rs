//! In-memory platform used by the integration tests.
//!
//! Three adapter layers (view → control → text field) plus a sectioned
//! table. Instances are `Rc` handles the way platform objects are
//! reference types; state a real toolkit keeps natively lives in cells.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use spark_bind::{
    apply_constructed, apply_dynamic, apply_notification, apply_output, apply_scoped_binding,
    apply_sections_binding, apply_synchronous, Animation, Binding, BindingError, BindingKind, Constructed,
    Constructor, ControlScope, DelegateMethod, Dynamic, InstanceId, Lifetime, LiveCollection, LiveInstance,
    LiveSections, Multiplexer, NoBinding, Output, PrepareContext, Preparer, Registration, Root, ScopedValues,
    Section, SectionMutation, Storage, Streamed, Synchronous,
};

// =============================================================================
// Native events
// =============================================================================

/// Target-action style listener list, as a toolkit keeps per event.
pub struct Listeners<V> {
    entries: RefCell<Vec<(u64, Rc<dyn Fn(V)>)>>,
    next_id: Cell<u64>,
}

impl<V: Clone + 'static> Listeners<V> {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    pub fn add(self: &Rc<Self>, listener: Rc<dyn Fn(V)>) -> Lifetime {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, listener));
        let weak = Rc::downgrade(self);
        Lifetime::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.entries.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn fire(&self, value: V) {
        let snapshot: Vec<_> = self.entries.borrow().iter().map(|(_, f)| f.clone()).collect();
        for listener in snapshot {
            listener(value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

// =============================================================================
// View
// =============================================================================

/// Every adapter's platform object bottoms out in a view, which owns the
/// registration; the last owning handle dropped releases the instance.
#[derive(Clone)]
pub struct View {
    pub id: InstanceId,
    registration: Option<Rc<Registration>>,
    pub hidden: Rc<Cell<bool>>,
    pub tint: Rc<RefCell<String>>,
}

impl View {
    fn new(registration: Rc<Registration>) -> Self {
        Self {
            id: registration.id(),
            registration: Some(registration),
            hidden: Rc::new(Cell::new(false)),
            tint: Rc::new(RefCell::new(String::from("default"))),
        }
    }
}

impl LiveInstance for View {
    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn unowned(&self) -> Self {
        Self {
            registration: None,
            ..self.clone()
        }
    }
}

pub enum ViewBinding {
    Hidden(Dynamic<bool>),
    Tint(Dynamic<String>),
}

impl Binding for ViewBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::Valued
    }

    fn name(&self) -> &'static str {
        match self {
            ViewBinding::Hidden(_) => "hidden",
            ViewBinding::Tint(_) => "tint",
        }
    }
}

#[derive(Default)]
pub struct ViewPreparer {
    root: Root<View>,
}

impl Preparer for ViewPreparer {
    type Instance = View;
    type Binding = ViewBinding;
    type Inherited = Root<View>;

    fn inherited(&self) -> &Root<View> {
        &self.root
    }

    fn inherited_mut(&mut self) -> &mut Root<View> {
        &mut self.root
    }

    fn inherited_binding(_: &ViewBinding) -> Option<&NoBinding> {
        None
    }

    fn upcast(instance: &View) -> &View {
        instance
    }

    fn apply_binding(&self, binding: &ViewBinding, instance: &View, _: &Rc<Storage>) -> Result<Option<Lifetime>, BindingError> {
        Ok(match binding {
            ViewBinding::Hidden(hidden) => apply_dynamic(hidden, instance, |view, hidden| view.hidden.set(hidden)),
            ViewBinding::Tint(tint) => apply_dynamic(tint, instance, |view, tint| *view.tint.borrow_mut() = tint),
        })
    }
}

// =============================================================================
// Control
// =============================================================================

#[derive(Clone)]
pub struct Control {
    pub view: View,
    pub enabled: Rc<Cell<bool>>,
    /// Title per scope, as set through the platform's per-state setter.
    pub titles: Rc<RefCell<HashMap<ControlScope, String>>>,
    /// Every per-scope setter call, in order.
    pub title_calls: Rc<RefCell<Vec<String>>>,
    pub primary_action: Rc<Listeners<()>>,
}

impl Control {
    fn new(registration: Rc<Registration>) -> Self {
        Self {
            view: View::new(registration),
            enabled: Rc::new(Cell::new(true)),
            titles: Rc::new(RefCell::new(HashMap::new())),
            title_calls: Rc::new(RefCell::new(Vec::new())),
            primary_action: Listeners::new(),
        }
    }

    fn set_title(&self, scope: &ControlScope, title: Option<&String>) {
        let mut titles = self.titles.borrow_mut();
        match title {
            Some(title) => {
                self.title_calls.borrow_mut().push(format!("set {title}"));
                titles.insert(*scope, title.clone());
            }
            None => {
                let old = titles.remove(scope).unwrap_or_default();
                self.title_calls.borrow_mut().push(format!("clear {old}"));
            }
        }
    }

    pub fn title(&self, scope: ControlScope) -> Option<String> {
        self.titles.borrow().get(&scope).cloned()
    }
}

impl LiveInstance for Control {
    fn instance_id(&self) -> InstanceId {
        self.view.id
    }

    fn unowned(&self) -> Self {
        Self {
            view: self.view.unowned(),
            ..self.clone()
        }
    }
}

pub enum ControlBinding {
    Inherited(ViewBinding),
    Enabled(Dynamic<bool>),
    Titles(Dynamic<ScopedValues<ControlScope, String>>),
    PrimaryAction(Output<()>),
}

impl Binding for ControlBinding {
    fn kind(&self) -> BindingKind {
        match self {
            ControlBinding::Inherited(_) => BindingKind::Inherited,
            ControlBinding::Enabled(_) | ControlBinding::Titles(_) => BindingKind::Valued,
            ControlBinding::PrimaryAction(_) => BindingKind::Output,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ControlBinding::Inherited(binding) => binding.name(),
            ControlBinding::Enabled(_) => "enabled",
            ControlBinding::Titles(_) => "titles",
            ControlBinding::PrimaryAction(_) => "primary_action",
        }
    }
}

#[derive(Default)]
pub struct ControlPreparer {
    view: ViewPreparer,
}

impl Preparer for ControlPreparer {
    type Instance = Control;
    type Binding = ControlBinding;
    type Inherited = ViewPreparer;

    fn inherited(&self) -> &ViewPreparer {
        &self.view
    }

    fn inherited_mut(&mut self) -> &mut ViewPreparer {
        &mut self.view
    }

    fn inherited_binding(binding: &ControlBinding) -> Option<&ViewBinding> {
        match binding {
            ControlBinding::Inherited(binding) => Some(binding),
            _ => None,
        }
    }

    fn upcast(instance: &Control) -> &View {
        &instance.view
    }

    fn apply_binding(
        &self,
        binding: &ControlBinding,
        instance: &Control,
        storage: &Rc<Storage>,
    ) -> Result<Option<Lifetime>, BindingError> {
        Ok(match binding {
            ControlBinding::Inherited(_) => None,
            ControlBinding::Enabled(enabled) => {
                apply_dynamic(enabled, instance, |control, enabled| control.enabled.set(enabled))
            }
            ControlBinding::Titles(titles) => apply_scoped_binding(
                titles,
                instance,
                storage,
                "titles",
                |control, scope| control.set_title(scope, None),
                |control, scope, title| control.set_title(scope, Some(title)),
            ),
            ControlBinding::PrimaryAction(action) => {
                let listeners = instance.primary_action.clone();
                apply_output(action, move |sink| listeners.add(sink))
            }
        })
    }
}

// =============================================================================
// Text field
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Line,
    Rounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextFieldMethod {
    ShouldReturn,
    ShouldClear,
    DidBeginEditing,
}

impl DelegateMethod for TextFieldMethod {
    fn returns_value(self) -> bool {
        matches!(self, TextFieldMethod::ShouldReturn | TextFieldMethod::ShouldClear)
    }
}

#[derive(Clone)]
pub struct TextField {
    pub control: Control,
    pub border: BorderStyle,
    pub placeholder: Rc<RefCell<Option<String>>>,
    pub text: Rc<RefCell<String>>,
    pub text_changed: Rc<Listeners<String>>,
    pub delegate: Rc<RefCell<Option<Rc<Multiplexer<TextFieldMethod>>>>>,
}

impl TextField {
    pub fn id(&self) -> InstanceId {
        self.control.view.id
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// What the platform does when the user edits the text.
    pub fn type_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
        self.text_changed.fire(text.to_string());
    }

    /// What the platform does when return is pressed: ask the delegate,
    /// defaulting to `true` when nothing answers.
    pub fn press_return(&self) -> bool {
        match self.delegate.borrow().as_ref() {
            Some(delegate) if delegate.responds_to(TextFieldMethod::ShouldReturn) => {
                delegate.invoke::<(), bool>(TextFieldMethod::ShouldReturn, ())
            }
            _ => true,
        }
    }

    pub fn begin_editing(&self) {
        if let Some(delegate) = self.delegate.borrow().as_ref() {
            delegate.notify(TextFieldMethod::DidBeginEditing, ());
        }
    }

    pub fn multiplexer(&self) -> Option<Rc<Multiplexer<TextFieldMethod>>> {
        self.delegate.borrow().clone()
    }
}

impl LiveInstance for TextField {
    fn instance_id(&self) -> InstanceId {
        self.control.view.id
    }

    fn unowned(&self) -> Self {
        Self {
            control: self.control.unowned(),
            ..self.clone()
        }
    }
}

pub enum TextFieldBinding {
    Inherited(ControlBinding),
    BorderStyle(Constructed<BorderStyle>),
    Placeholder(Constructed<String>),
    Text(Dynamic<String>),
    TextChanged(Output<String>),
    ShouldReturn(Synchronous<(), bool>),
    ShouldClear(Synchronous<(), bool>),
    DidBeginEditing(Synchronous<()>),
}

impl Binding for TextFieldBinding {
    fn kind(&self) -> BindingKind {
        match self {
            TextFieldBinding::Inherited(_) => BindingKind::Inherited,
            TextFieldBinding::BorderStyle(_) | TextFieldBinding::Placeholder(_) => BindingKind::Constructed,
            TextFieldBinding::Text(_) => BindingKind::Valued,
            TextFieldBinding::TextChanged(_) => BindingKind::Output,
            TextFieldBinding::ShouldReturn(_)
            | TextFieldBinding::ShouldClear(_)
            | TextFieldBinding::DidBeginEditing(_) => BindingKind::Synchronous,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TextFieldBinding::Inherited(binding) => binding.name(),
            TextFieldBinding::BorderStyle(_) => "border_style",
            TextFieldBinding::Placeholder(_) => "placeholder",
            TextFieldBinding::Text(_) => "text",
            TextFieldBinding::TextChanged(_) => "text_changed",
            TextFieldBinding::ShouldReturn(_) => "should_return",
            TextFieldBinding::ShouldClear(_) => "should_clear",
            TextFieldBinding::DidBeginEditing(_) => "did_begin_editing",
        }
    }
}

#[derive(Default)]
pub struct TextFieldPreparer {
    control: ControlPreparer,
    border: Option<BorderStyle>,
}

impl Preparer for TextFieldPreparer {
    type Instance = TextField;
    type Binding = TextFieldBinding;
    type Inherited = ControlPreparer;

    fn inherited(&self) -> &ControlPreparer {
        &self.control
    }

    fn inherited_mut(&mut self) -> &mut ControlPreparer {
        &mut self.control
    }

    fn inherited_binding(binding: &TextFieldBinding) -> Option<&ControlBinding> {
        match binding {
            TextFieldBinding::Inherited(binding) => Some(binding),
            _ => None,
        }
    }

    fn upcast(instance: &TextField) -> &Control {
        &instance.control
    }

    fn prepare_binding(&mut self, binding: &TextFieldBinding, context: &mut PrepareContext) -> Result<(), BindingError> {
        match binding {
            TextFieldBinding::BorderStyle(style) => {
                context.record_constructed("border_style", style.value())?;
                self.border = Some(*style.value());
            }
            TextFieldBinding::Placeholder(placeholder) => {
                context.record_constructed("placeholder", placeholder.value())?;
            }
            TextFieldBinding::ShouldReturn(_) | TextFieldBinding::ShouldClear(_) | TextFieldBinding::DidBeginEditing(_) => {
                context.select_delegate::<TextFieldMethod>();
            }
            _ => {}
        }
        Ok(())
    }

    fn install_delegates(&self, instance: &TextField, storage: &Storage) {
        storage.install_delegate::<TextFieldMethod>(|multiplexer| {
            *instance.delegate.borrow_mut() = Some(multiplexer);
        });
    }

    fn apply_binding(
        &self,
        binding: &TextFieldBinding,
        instance: &TextField,
        storage: &Rc<Storage>,
    ) -> Result<Option<Lifetime>, BindingError> {
        match binding {
            TextFieldBinding::Inherited(_) => Ok(None),
            TextFieldBinding::BorderStyle(_) => Ok(None),
            TextFieldBinding::Placeholder(placeholder) => Ok(apply_constructed(placeholder, instance, |field, text| {
                *field.placeholder.borrow_mut() = Some(text);
            })),
            TextFieldBinding::Text(text) => Ok(apply_dynamic(text, instance, |field, text| {
                *field.text.borrow_mut() = text;
            })),
            TextFieldBinding::TextChanged(output) => {
                let listeners = instance.text_changed.clone();
                Ok(apply_output(output, move |sink| listeners.add(sink)))
            }
            TextFieldBinding::ShouldReturn(handler) => {
                apply_synchronous(handler, storage, TextFieldMethod::ShouldReturn)
            }
            TextFieldBinding::ShouldClear(handler) => apply_synchronous(handler, storage, TextFieldMethod::ShouldClear),
            TextFieldBinding::DidBeginEditing(handler) => {
                apply_notification(handler, storage, TextFieldMethod::DidBeginEditing)
            }
        }
    }
}

impl Constructor for TextFieldPreparer {
    const KIND: &'static str = "TextField";
    type Parameters = ();

    fn construct_instance(&mut self, registration: Rc<Registration>, _: ()) -> TextField {
        TextField {
            control: Control::new(registration),
            border: self.border.unwrap_or_default(),
            placeholder: Rc::new(RefCell::new(None)),
            text: Rc::new(RefCell::new(String::new())),
            text_changed: Listeners::new(),
            delegate: Rc::new(RefCell::new(None)),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableMethod {
    DidSelectRow,
    HeightForRow,
}

impl DelegateMethod for TableMethod {
    fn returns_value(self) -> bool {
        self == TableMethod::HeightForRow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSourceMethod {
    CanEditRow,
}

impl DelegateMethod for TableSourceMethod {
    fn returns_value(self) -> bool {
        true
    }
}

/// Rows grouped in sections, each with an optional header.
#[derive(Debug, Default)]
pub struct TableContents {
    pub sections: Vec<(Option<String>, Vec<String>)>,
    pub calls: Vec<String>,
}

#[derive(Clone)]
pub struct Table {
    pub view: View,
    pub contents: Rc<RefCell<TableContents>>,
    pub delegate: Rc<RefCell<Option<Rc<Multiplexer<TableMethod>>>>>,
    pub data_source: Rc<RefCell<Option<Rc<Multiplexer<TableSourceMethod>>>>>,
}

impl Table {
    /// Row text per section, concatenated with `,`.
    pub fn rows(&self) -> Vec<String> {
        self.contents
            .borrow()
            .sections
            .iter()
            .map(|(_, rows)| rows.join(","))
            .collect()
    }

    pub fn headers(&self) -> Vec<Option<String>> {
        self.contents.borrow().sections.iter().map(|(header, _)| header.clone()).collect()
    }

    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut self.contents.borrow_mut().calls)
    }

    pub fn select(&self, path: (usize, usize)) {
        if let Some(delegate) = self.delegate.borrow().as_ref() {
            delegate.notify(TableMethod::DidSelectRow, path);
        }
    }

    pub fn can_edit(&self, path: (usize, usize)) -> bool {
        match self.data_source.borrow().as_ref() {
            Some(source) if source.responds_to(TableSourceMethod::CanEditRow) => {
                source.invoke::<(usize, usize), bool>(TableSourceMethod::CanEditRow, path)
            }
            _ => false,
        }
    }
}

impl LiveInstance for Table {
    fn instance_id(&self) -> InstanceId {
        self.view.id
    }

    fn unowned(&self) -> Self {
        Self {
            view: self.view.unowned(),
            ..self.clone()
        }
    }
}

/// Platform handle used by the differ.
pub struct TableHandle(Rc<RefCell<TableContents>>);

pub struct SectionRows<'a> {
    table: &'a TableHandle,
    section: usize,
}

impl TableHandle {
    fn log(&self, call: String) {
        self.0.borrow_mut().calls.push(call);
    }
}

impl LiveCollection<String, String> for SectionRows<'_> {
    fn insert(&mut self, range: Range<usize>, elements: Vec<String>, _: Animation) {
        self.table.log(format!("rows {} insert {range:?}", self.section));
        let mut contents = self.table.0.borrow_mut();
        let rows = &mut contents.sections[self.section].1;
        for (index, row) in range.zip(elements) {
            rows.insert(index, row);
        }
    }

    fn remove(&mut self, range: Range<usize>, _: Animation) {
        self.table.log(format!("rows {} remove {range:?}", self.section));
        self.table.0.borrow_mut().sections[self.section].1.drain(range);
    }

    fn move_item(&mut self, from: usize, to: usize) {
        self.table.log(format!("rows {} move {from}->{to}", self.section));
        let mut contents = self.table.0.borrow_mut();
        let rows = &mut contents.sections[self.section].1;
        let row = rows.remove(from);
        rows.insert(to, row);
    }

    fn update(&mut self, index: usize, element: String, _: Animation) {
        self.table.log(format!("rows {} update {index}", self.section));
        self.table.0.borrow_mut().sections[self.section].1[index] = element;
    }

    fn reload(&mut self, range: Range<usize>, elements: Vec<String>, _: Animation) {
        self.table.log(format!("rows {} reload {range:?}", self.section));
        self.table.0.borrow_mut().sections[self.section].1.splice(range, elements);
    }

    fn refresh(&mut self, range: Range<usize>, _: Animation) {
        self.table.log(format!("rows {} refresh {range:?}", self.section));
    }

    fn set_metadata(&mut self, header: String) {
        self.table.0.borrow_mut().sections[self.section].0 = Some(header);
    }
}

impl LiveSections<String, String> for TableHandle {
    type Rows<'a> = SectionRows<'a>;

    fn insert_sections(&mut self, range: Range<usize>, sections: Vec<Section<String, String>>, _: Animation) {
        self.log(format!("insert sections {range:?}"));
        let mut contents = self.0.borrow_mut();
        for (index, section) in range.zip(sections) {
            contents.sections.insert(index, (section.metadata, section.rows));
        }
    }

    fn remove_sections(&mut self, range: Range<usize>, _: Animation) {
        self.log(format!("remove sections {range:?}"));
        self.0.borrow_mut().sections.drain(range);
    }

    fn move_section(&mut self, from: usize, to: usize) {
        self.log(format!("move section {from}->{to}"));
        let mut contents = self.0.borrow_mut();
        let section = contents.sections.remove(from);
        contents.sections.insert(to, section);
    }

    fn reload_sections(&mut self, range: Range<usize>, sections: Vec<Section<String, String>>, _: Animation) {
        self.log(format!("reload sections {range:?}"));
        self.0
            .borrow_mut()
            .sections
            .splice(range, sections.into_iter().map(|section| (section.metadata, section.rows)));
    }

    fn refresh_sections(&mut self, range: Range<usize>, _: Animation) {
        self.log(format!("refresh sections {range:?}"));
    }

    fn reload_section_metadata(&mut self, section: usize, header: String, _: Animation) {
        self.log(format!("reload header {section}"));
        self.0.borrow_mut().sections[section].0 = Some(header);
    }

    fn rows(&mut self, section: usize) -> SectionRows<'_> {
        SectionRows { table: self, section }
    }
}

pub enum TableBinding {
    Inherited(ViewBinding),
    Sections(Streamed<SectionMutation<String, String>>),
    DidSelectRow(Synchronous<(usize, usize)>),
    CanEditRow(Synchronous<(usize, usize), bool>),
}

impl Binding for TableBinding {
    fn kind(&self) -> BindingKind {
        match self {
            TableBinding::Inherited(_) => BindingKind::Inherited,
            TableBinding::Sections(_) => BindingKind::Streamed,
            TableBinding::DidSelectRow(_) | TableBinding::CanEditRow(_) => BindingKind::Synchronous,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TableBinding::Inherited(binding) => binding.name(),
            TableBinding::Sections(_) => "sections",
            TableBinding::DidSelectRow(_) => "did_select_row",
            TableBinding::CanEditRow(_) => "can_edit_row",
        }
    }
}

#[derive(Default)]
pub struct TablePreparer {
    view: ViewPreparer,
}

impl Preparer for TablePreparer {
    type Instance = Table;
    type Binding = TableBinding;
    type Inherited = ViewPreparer;

    fn inherited(&self) -> &ViewPreparer {
        &self.view
    }

    fn inherited_mut(&mut self) -> &mut ViewPreparer {
        &mut self.view
    }

    fn inherited_binding(binding: &TableBinding) -> Option<&ViewBinding> {
        match binding {
            TableBinding::Inherited(binding) => Some(binding),
            _ => None,
        }
    }

    fn upcast(instance: &Table) -> &View {
        &instance.view
    }

    fn prepare_binding(&mut self, binding: &TableBinding, context: &mut PrepareContext) -> Result<(), BindingError> {
        match binding {
            TableBinding::DidSelectRow(_) => context.select_delegate::<TableMethod>(),
            TableBinding::CanEditRow(_) => context.select_delegate::<TableSourceMethod>(),
            _ => {}
        }
        Ok(())
    }

    fn install_delegates(&self, instance: &Table, storage: &Storage) {
        storage.install_delegate::<TableMethod>(|multiplexer| {
            *instance.delegate.borrow_mut() = Some(multiplexer);
        });
        storage.install_delegate::<TableSourceMethod>(|multiplexer| {
            *instance.data_source.borrow_mut() = Some(multiplexer);
        });
    }

    fn apply_binding(
        &self,
        binding: &TableBinding,
        instance: &Table,
        storage: &Rc<Storage>,
    ) -> Result<Option<Lifetime>, BindingError> {
        match binding {
            TableBinding::Inherited(_) => Ok(None),
            TableBinding::Sections(sections) => Ok(apply_sections_binding(
                sections,
                instance,
                storage,
                "sections",
                |table: &Table| TableHandle(table.contents.clone()),
            )),
            TableBinding::DidSelectRow(handler) => apply_notification(handler, storage, TableMethod::DidSelectRow),
            TableBinding::CanEditRow(handler) => apply_synchronous(handler, storage, TableSourceMethod::CanEditRow),
        }
    }
}

impl Constructor for TablePreparer {
    const KIND: &'static str = "Table";
    type Parameters = ();

    fn construct_instance(&mut self, registration: Rc<Registration>, _: ()) -> Table {
        Table {
            view: View::new(registration),
            contents: Rc::new(RefCell::new(TableContents::default())),
            delegate: Rc::new(RefCell::new(None)),
            data_source: Rc::new(RefCell::new(None)),
        }
    }
}

/// List handle over a plain `Vec`, for single-level collection bindings.
pub struct ListHandle(pub Rc<RefCell<Vec<String>>>);

impl LiveCollection<String> for ListHandle {
    fn insert(&mut self, range: Range<usize>, elements: Vec<String>, _: Animation) {
        let mut items = self.0.borrow_mut();
        for (index, item) in range.zip(elements) {
            items.insert(index, item);
        }
    }

    fn remove(&mut self, range: Range<usize>, _: Animation) {
        self.0.borrow_mut().drain(range);
    }

    fn move_item(&mut self, from: usize, to: usize) {
        let mut items = self.0.borrow_mut();
        let item = items.remove(from);
        items.insert(to, item);
    }

    fn update(&mut self, index: usize, element: String, _: Animation) {
        self.0.borrow_mut()[index] = element;
    }

    fn reload(&mut self, range: Range<usize>, elements: Vec<String>, _: Animation) {
        self.0.borrow_mut().splice(range, elements);
    }

    fn refresh(&mut self, _: Range<usize>, _: Animation) {}
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
