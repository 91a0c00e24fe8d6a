use std::fmt;

use crate::lexer::TypeSpec;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Bool,
    Char,
    Int,
    Float,
    Ptr(Box<Ty>),
    Ref(Box<Ty>),
    /// Return type first, then the parameter types.
    Func(Box<Ty>, Vec<Ty>),
}

impl Ty {
    pub fn from_type_spec(spec: TypeSpec) -> Self {
        match spec {
            TypeSpec::Bool => Ty::Bool,
            TypeSpec::Char => Ty::Char,
            TypeSpec::Int => Ty::Int,
            TypeSpec::Float => Ty::Float,
        }
    }

    pub fn pointer_to(ty: Ty) -> Self {
        Ty::Ptr(Box::new(ty))
    }

    /// A reference to `ty`. References never nest: asking for a reference to
    /// a reference returns the reference unchanged.
    pub fn reference_to(ty: Ty) -> Self {
        match ty {
            Ty::Ref(_) => ty,
            ty => Ty::Ref(Box::new(ty)),
        }
    }

    pub fn function(ret: Ty, params: Vec<Ty>) -> Self {
        Ty::Func(Box::new(ret), params)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Ty::Ref(_))
    }

    pub fn is_reference_to(&self, other: &Ty) -> bool {
        matches!(self, Ty::Ref(inner) if **inner == *other)
    }

    /// The type of the object a reference designates, or the type itself.
    pub fn object_type(&self) -> &Ty {
        match self {
            Ty::Ref(inner) => inner,
            ty => ty,
        }
    }

    pub fn is_object(&self) -> bool {
        !matches!(self, Ty::Ref(_) | Ty::Func(_, _))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Ty::Bool)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Ty::Int)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Ty::Func(_, _))
    }

    pub fn is_integral(&self) -> bool {
        self.is_int()
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_arithmetic()
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Ty::Bool | Ty::Char | Ty::Int | Ty::Float | Ty::Ptr(_) | Ty::Func(_, _)
        )
    }

    pub fn return_type(&self) -> Option<&Ty> {
        match self {
            Ty::Func(ret, _) => Some(ret),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => write!(f, "bool"),
            Ty::Char => write!(f, "char"),
            Ty::Int => write!(f, "int"),
            Ty::Float => write!(f, "float"),
            Ty::Ptr(inner) => write!(f, "*{}", inner),
            Ty::Ref(inner) => write!(f, "&{}", inner),
            Ty::Func(ret, params) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}
