//! 调用链元素实例注册

use di_abstractions::{ChainElementProvider, Decorator, Interceptor};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 按类名登记的拦截器 / 装饰器实例
#[derive(Clone, Default)]
pub struct ChainElements {
    interceptors: HashMap<String, Arc<dyn Interceptor>>,
    decorators: HashMap<String, Arc<dyn Decorator>>,
}

impl ChainElements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interceptor(
        mut self,
        class: impl Into<String>,
        interceptor: impl Interceptor + 'static,
    ) -> Self {
        self.register_interceptor(class, Arc::new(interceptor));
        self
    }

    pub fn with_decorator(
        mut self,
        class: impl Into<String>,
        decorator: impl Decorator + 'static,
    ) -> Self {
        self.register_decorator(class, Arc::new(decorator));
        self
    }

    /// 登记拦截器，同名实例会被替换
    pub fn register_interceptor(&mut self, class: impl Into<String>, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.insert(class.into(), interceptor);
    }

    /// 登记装饰器，同名实例会被替换
    pub fn register_decorator(&mut self, class: impl Into<String>, decorator: Arc<dyn Decorator>) {
        self.decorators.insert(class.into(), decorator);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len() + self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty() && self.decorators.is_empty()
    }
}

impl ChainElementProvider for ChainElements {
    fn interceptor(&self, class: &str) -> Option<Arc<dyn Interceptor>> {
        self.interceptors.get(class).cloned()
    }

    fn decorator(&self, class: &str) -> Option<Arc<dyn Decorator>> {
        self.decorators.get(class).cloned()
    }
}

impl fmt::Debug for ChainElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut interceptors: Vec<&String> = self.interceptors.keys().collect();
        let mut decorators: Vec<&String> = self.decorators.keys().collect();
        interceptors.sort();
        decorators.sort();
        f.debug_struct("ChainElements")
            .field("interceptors", &interceptors)
            .field("decorators", &decorators)
            .finish()
    }
}
