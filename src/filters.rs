// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Filter 列表
//!
//! 每种 Action 各自持有一份有序、按名称去重的 before/after filter 列表。
//! 派生配置时列表按值复制，之后父子两份互不影响。

use crate::{action::ActionContext, exception::Exception};
use std::fmt;
use std::sync::Arc;

pub type FilterFn<A> =
    Arc<dyn Fn(&mut A, &mut ActionContext<'_>) -> Result<(), Exception> + Send + Sync>;

pub struct Filter<A> {
    name: String,
    run: FilterFn<A>,
}

impl<A> Filter<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self, action: &mut A, cx: &mut ActionContext<'_>) -> Result<(), Exception> {
        (self.run)(action, cx)
    }
}

impl<A> Clone for Filter<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<A> fmt::Debug for Filter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.name).finish()
    }
}

pub struct FilterList<A> {
    filters: Vec<Filter<A>>,
}

impl<A: 'static> FilterList<A> {
    pub fn new() -> Self {
        Self { filters: vec![] }
    }

    /// 追加一个 filter。同名 filter 已存在时不做任何修改并返回 `false`，保持首次注册的顺序。
    pub fn add<F>(&mut self, name: &str, filter: F) -> bool
    where
        F: Fn(&mut A, &mut ActionContext<'_>) -> Result<(), Exception> + Send + Sync + 'static,
    {
        if self.contains(name) {
            return false;
        }
        self.filters.push(Filter {
            name: name.to_string(),
            run: boxed(filter),
        });
        true
    }

    /// 移除同名 filter，不存在时为空操作
    pub fn skip(&mut self, name: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.name != name);
        self.filters.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter<A>> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// 把列表转换为嵌入了 `A` 的类型 `B` 可用的列表，名称与顺序不变
    pub fn lift<B>(&self) -> FilterList<B>
    where
        B: AsMut<A> + 'static,
    {
        let filters = self
            .filters
            .iter()
            .map(|f| {
                let run = Arc::clone(&f.run);
                Filter {
                    name: f.name.clone(),
                    run: boxed(move |b: &mut B, cx| run(<B as AsMut<A>>::as_mut(b), cx)),
                }
            })
            .collect();
        FilterList { filters }
    }
}

fn boxed<A, F>(filter: F) -> FilterFn<A>
where
    F: Fn(&mut A, &mut ActionContext<'_>) -> Result<(), Exception> + Send + Sync + 'static,
{
    Arc::new(filter)
}

impl<A: 'static> Default for FilterList<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for FilterList<A> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<A> fmt::Debug for FilterList<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.filters).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        param::HttpRequestMethod, params::Params, request::Request, serializer::StandardJson,
    };

    #[derive(Default)]
    struct Base {
        hits: Vec<&'static str>,
    }

    struct Child {
        base: Base,
    }

    impl AsMut<Base> for Child {
        fn as_mut(&mut self) -> &mut Base {
            &mut self.base
        }
    }

    fn noop(_: &mut Base, _: &mut ActionContext<'_>) -> Result<(), Exception> {
        Ok(())
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut list = FilterList::<Base>::new();
        assert!(list.add("auth", noop));
        assert!(list.add("audit", noop));
        assert!(!list.add("auth", noop));

        assert_eq!(list.names(), vec!["auth", "audit"]);
    }

    #[test]
    fn test_skip_missing_is_noop() {
        let mut list = FilterList::<Base>::new();
        list.add("auth", noop);
        assert!(!list.skip("missing"));
        assert!(list.skip("auth"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut parent = FilterList::<Base>::new();
        parent.add("auth", noop);
        let mut child = parent.clone();
        child.skip("auth");
        child.add("cache", noop);

        assert_eq!(parent.names(), vec!["auth"]);
        assert_eq!(child.names(), vec!["cache"]);
    }

    #[test]
    fn test_lift_keeps_names_and_order() {
        let mut list = FilterList::<Base>::new();
        list.add("first", |b: &mut Base, _: &mut ActionContext<'_>| {
            b.hits.push("first");
            Ok(())
        });
        list.add("second", noop);
        let lifted: FilterList<Child> = list.lift();

        assert_eq!(lifted.names(), vec!["first", "second"]);
        assert_eq!(format!("{:?}", lifted), r#"[Filter("first"), Filter("second")]"#);

        let request = Request::new(HttpRequestMethod::Get, "/");
        let mut cx = ActionContext::new(&request, Params::new(), Arc::new(StandardJson));
        let mut child = Child {
            base: Base::default(),
        };
        for filter in lifted.iter() {
            filter.run(&mut child, &mut cx).unwrap();
        }
        assert_eq!(child.base.hits, vec!["first"]);
    }
}
